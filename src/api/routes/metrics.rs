//! Counter snapshot

use crate::api::server::AppState;
use crate::services::MetricsSnapshot;
use axum::{extract::State, Json};

/// `GET /api/metrics`
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot().await)
}
