use axum::{
    extract::{Json, Query},
    routing::get,
    Router,
};
use serde::Deserialize;
use vipride_core::distance::{self, Location, TransferKind, TripEstimate};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DistanceQuery {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub kind: TransferKind,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/distance", get(estimate_trip))
        .route("/api/locations", get(list_locations))
}

/// GET /api/distance?from=ist-airport&to=taksim&kind=airport
async fn estimate_trip(Query(query): Query<DistanceQuery>) -> Json<TripEstimate> {
    Json(distance::estimate(&query.from, &query.to, query.kind))
}

/// GET /api/locations
async fn list_locations() -> Json<&'static [Location]> {
    Json(distance::LOCATIONS)
}
