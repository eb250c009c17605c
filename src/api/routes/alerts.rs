//! Alert listing, stats and per-sport counts for the dashboard

use super::{bad_request, database_error, ApiError};
use crate::api::server::AppState;
use crate::dashboard::types::{
    AlertsFilters, AlertsResponse, ApiAlert, SportCount, SportsResponse, StatsResponse,
};
use crate::db::AlertQuery;
use crate::types::AlertReason;
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Query parameters for `GET /api/alerts`
#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    pub sport: Option<String>,
    /// `ev+` or `anomalia`
    pub alert_type: Option<String>,
    pub market: Option<String>,
    pub league: Option<String>,
    pub sent: Option<bool>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `GET /api/alerts`
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<AlertsResponse>, ApiError> {
    let reason = match non_empty(&query.alert_type) {
        Some(t) => Some(t.parse::<AlertReason>().map_err(bad_request)?),
        None => None,
    };
    let limit = query.limit.clamp(1, MAX_LIMIT);

    let records = state
        .db
        .query_alerts(&AlertQuery {
            sport: non_empty(&query.sport),
            reason,
            market: non_empty(&query.market),
            league: non_empty(&query.league),
            sent: query.sent,
            limit,
        })
        .await
        .map_err(database_error)?;

    let alerts: Vec<ApiAlert> = records.iter().map(ApiAlert::from).collect();

    Ok(Json(AlertsResponse {
        total: alerts.len(),
        alerts,
        filters: AlertsFilters {
            sport: query.sport,
            alert_type: query.alert_type,
            limit,
        },
    }))
}

/// `GET /api/stats`
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.db.alert_stats().await.map_err(database_error)?;

    Ok(Json(StatsResponse {
        total_alertas: stats.total,
        alertas_ev: stats.ev,
        anomalias: stats.anomalies,
        enviadas: stats.sent,
        last_update: Utc::now(),
    }))
}

/// `GET /api/sports`
pub async fn list_sports(State(state): State<AppState>) -> Result<Json<SportsResponse>, ApiError> {
    let counts = state.db.sport_counts().await.map_err(database_error)?;

    Ok(Json(SportsResponse {
        sports: counts
            .into_iter()
            .map(|(name, count)| SportCount { name, count })
            .collect(),
    }))
}
