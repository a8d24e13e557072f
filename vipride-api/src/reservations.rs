use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;
use tracing::info;
use vipride_core::{NewReservation, Reservation, ReservationStatus};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reservations", get(list_reservations).post(create_reservation))
        .route("/reservations/{id}", get(get_reservation))
        .route("/reservations/{id}/status", patch(update_reservation_status))
}

fn parse_status(raw: &str) -> Result<ReservationStatus, AppError> {
    raw.parse::<ReservationStatus>()
        .map_err(|e| AppError::ValidationError(e.to_string()))
}

/// GET /reservations
/// All reservations, newest first
async fn list_reservations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let reservations = state.reservations.find_all().await?;
    Ok(Json(reservations))
}

/// GET /reservations/{id}
async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state.reservations.find_by_id(id).await?
        .ok_or_else(|| AppError::NotFoundError("Reservation not found".to_string()))?;
    Ok(Json(reservation))
}

/// POST /reservations
async fn create_reservation(
    State(state): State<AppState>,
    Json(mut req): Json<NewReservation>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    req.status = parse_status(&req.status)?.to_string();

    let id = state.reservations.create(&req).await?;
    let reservation = state.reservations.find_by_id(id).await?
        .ok_or_else(|| AppError::InternalServerError(format!("Reservation {} missing after insert", id)))?;

    info!(reservation_id = id, "Reservation created via API");
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// PATCH /reservations/{id}/status
async fn update_reservation_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Reservation>, AppError> {
    let status = parse_status(&req.status)?;

    state.reservations.update_status(id, status.as_str()).await?;
    let reservation = state.reservations.find_by_id(id).await?
        .ok_or_else(|| AppError::NotFoundError("Reservation not found".to_string()))?;

    info!(reservation_id = id, %status, "Reservation status changed");
    Ok(Json(reservation))
}
