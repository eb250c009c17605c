//! HTTP client for the dashboard API.
//!
//! Every call degrades to an empty default instead of failing, so the
//! dashboard always has something to render.

use super::types::{AlertsFilters, AlertsResponse, SportCount, SportsResponse, StatsResponse};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::error;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Everything the dashboard shows on load
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub stats: StatsResponse,
    pub alerts: AlertsResponse,
    pub sports: Vec<SportCount>,
}

#[derive(Clone)]
pub struct DashboardClient {
    client: Client,
    base_url: String,
}

/// Query value for an optional filter, None when unset or `todas`
fn filter_param(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("todas"))
}

impl DashboardClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Base URL from `BETDESK_API_URL`, localhost:8000 otherwise
    pub fn from_env() -> Self {
        let base = std::env::var("BETDESK_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::new(base)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, reqwest::Error> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await
    }

    pub async fn get_stats(&self) -> StatsResponse {
        match self.get_json("/api/stats", &[]).await {
            Ok(stats) => stats,
            Err(e) => {
                error!("Error fetching stats: {}", e);
                StatsResponse::empty()
            }
        }
    }

    pub async fn get_alerts(
        &self,
        sport: Option<&str>,
        alert_type: Option<&str>,
        limit: i64,
    ) -> AlertsResponse {
        let sport = filter_param(sport);
        let alert_type = filter_param(alert_type);

        let mut query = Vec::new();
        if let Some(s) = sport {
            query.push(("sport", s.to_string()));
        }
        if let Some(t) = alert_type {
            query.push(("alert_type", t.to_string()));
        }
        query.push(("limit", limit.to_string()));

        match self.get_json("/api/alerts", &query).await {
            Ok(alerts) => alerts,
            Err(e) => {
                error!("Error fetching alerts: {}", e);
                AlertsResponse {
                    alerts: Vec::new(),
                    total: 0,
                    filters: AlertsFilters {
                        sport: sport.map(str::to_string),
                        alert_type: alert_type.map(str::to_string),
                        limit,
                    },
                }
            }
        }
    }

    pub async fn get_sports(&self) -> Vec<SportCount> {
        match self.get_json::<SportsResponse>("/api/sports", &[]).await {
            Ok(resp) => resp.sports,
            Err(e) => {
                error!("Error fetching sports: {}", e);
                Vec::new()
            }
        }
    }

    /// True only for a 2xx from `/api/health`
    pub async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                error!("Health check failed: {}", e);
                false
            }
        }
    }

    /// Stats, alerts and sports fetched concurrently
    pub async fn load(&self, sport: Option<&str>, alert_type: Option<&str>, limit: i64) -> DashboardData {
        let (stats, alerts, sports) = futures::join!(
            self.get_stats(),
            self.get_alerts(sport, alert_type, limit),
            self.get_sports()
        );
        DashboardData {
            stats,
            alerts,
            sports,
        }
    }
}
