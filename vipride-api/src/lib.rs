use axum::{http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod distance;
pub mod email;
pub mod error;
pub mod payment;
pub mod reservations;
pub mod state;

pub use state::{AppState, BookingSettings};

pub fn app(state: AppState) -> Router {
    // The booking site is served from a different origin
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .merge(payment::routes())
        .merge(email::routes())
        .merge(reservations::routes())
        .merge(distance::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
