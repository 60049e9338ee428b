use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use sirius_types::BusPosition;

use crate::bus::locations_document;
use crate::state::AppState;

/// GET /api/bus-locations - Raw upstream XML with tiered fallback.
///
/// Always answers 200 with `application/xml`: live upstream body, else the
/// last snapshot, else the minimal empty document.
pub async fn get_locations(State(state): State<AppState>) -> impl IntoResponse {
    let body =
        locations_document(&state.http, &state.bus.upstream_url, &state.bus.snapshot_path).await;

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        body,
    )
}

/// GET /api/bus-locations/positions - Parsed JSON view from the tracker
pub async fn get_positions(State(state): State<AppState>) -> Json<Vec<BusPosition>> {
    Json(state.bus_tracker.latest())
}
