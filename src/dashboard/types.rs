//! Wire and filter types shared by the API handlers and the dashboard client

use crate::types::AlertRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sport filter; `All` disables it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Basketball,
    Football,
    Tennis,
    #[default]
    All,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Basketball => "basketball",
            Sport::Football => "football",
            Sport::Tennis => "tennis",
            Sport::All => "all",
        }
    }
}

impl FromStr for Sport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "todas" | "" => Ok(Sport::All),
            other => other
                .parse::<crate::types::Sport>()
                .map(|sport| match sport {
                    crate::types::Sport::Basketball => Sport::Basketball,
                    crate::types::Sport::Football => Sport::Football,
                    crate::types::Sport::Tennis => Sport::Tennis,
                }),
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert type filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Anomaly,
    Ev,
    #[default]
    All,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Anomaly => "anomaly",
            AlertType::Ev => "ev",
            AlertType::All => "all",
        }
    }

    /// Value of the `alert_type` query parameter, None for `All`
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            AlertType::Ev => Some(ApiAlertType::Ev.as_str()),
            AlertType::Anomaly => Some(ApiAlertType::Anomalia.as_str()),
            AlertType::All => None,
        }
    }
}

impl FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "todas" | "" => Ok(AlertType::All),
            "ev" | "ev+" => Ok(AlertType::Ev),
            "anomaly" | "anomalia" | "anomalía" => Ok(AlertType::Anomaly),
            other => Err(format!("Unknown alert type: {}", other)),
        }
    }
}

/// Market filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarketType {
    #[serde(rename = "TOTAL")]
    Total,
    #[serde(rename = "SPREAD")]
    Spread,
    #[serde(rename = "MONEYLINE")]
    Moneyline,
    #[serde(rename = "1X2")]
    OneXTwo,
    #[serde(rename = "BTTS")]
    Btts,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl MarketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketType::Total => "TOTAL",
            MarketType::Spread => "SPREAD",
            MarketType::Moneyline => "MONEYLINE",
            MarketType::OneXTwo => "1X2",
            MarketType::Btts => "BTTS",
            MarketType::All => "all",
        }
    }
}

impl FromStr for MarketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ALL" | "" => Ok(MarketType::All),
            "TOTAL" => Ok(MarketType::Total),
            "SPREAD" => Ok(MarketType::Spread),
            "MONEYLINE" => Ok(MarketType::Moneyline),
            "1X2" => Ok(MarketType::OneXTwo),
            "BTTS" => Ok(MarketType::Btts),
            other => Err(format!("Unknown market: {}", other)),
        }
    }
}

/// Counters shown on the stat cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub ev_positive: usize,
    pub anomalies: usize,
    pub sent: usize,
}

/// Client-side filter selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub sport: Sport,
    pub alert_type: AlertType,
    pub market: MarketType,
    pub league: String,
    /// None shows sent and pending alerts
    pub sent: Option<bool>,
}

/// Alert type as the API labels it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiAlertType {
    #[serde(rename = "ev+")]
    Ev,
    #[serde(rename = "anomalia")]
    Anomalia,
}

impl ApiAlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiAlertType::Ev => "ev+",
            ApiAlertType::Anomalia => "anomalia",
        }
    }
}

/// One alert as returned by `GET /api/alerts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAlert {
    pub id: String,
    pub sport: String,
    pub league: String,
    #[serde(rename = "match")]
    pub match_name: String,
    pub market: String,
    pub line: Option<f64>,
    pub selection: String,
    pub odds: f64,
    pub bookmaker: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type")]
    pub alert_type: ApiAlertType,
    /// EV in percent, 0 for anomalies
    pub ev: f64,
    /// Raw score: EV fraction or |z|
    #[serde(default)]
    pub score: f64,
    pub timestamp: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
}

impl From<&AlertRecord> for ApiAlert {
    fn from(record: &AlertRecord) -> Self {
        let is_ev = record.is_ev();
        Self {
            id: record.id.to_string(),
            sport: record.sport.clone(),
            league: record.league.clone(),
            match_name: record.event.clone(),
            market: record.market.clone(),
            line: record.line,
            selection: record.selection.clone(),
            odds: record.odds,
            bookmaker: record.bookmaker.clone(),
            message: record.message.clone().unwrap_or_default(),
            alert_type: if is_ev {
                ApiAlertType::Ev
            } else {
                ApiAlertType::Anomalia
            },
            ev: if is_ev { record.score * 100.0 } else { 0.0 },
            score: record.score,
            timestamp: record.created_at_utc,
            start_time: record.start_time_utc,
            sent_at: record.sent_at_utc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(rename = "totalAlertas")]
    pub total_alertas: i64,
    #[serde(rename = "alertasEV")]
    pub alertas_ev: i64,
    pub anomalias: i64,
    pub enviadas: i64,
    #[serde(rename = "lastUpdate")]
    pub last_update: DateTime<Utc>,
}

impl StatsResponse {
    pub fn empty() -> Self {
        Self {
            total_alertas: 0,
            alertas_ev: 0,
            anomalias: 0,
            enviadas: 0,
            last_update: Utc::now(),
        }
    }
}

/// Filters echoed back by `GET /api/alerts`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertsFilters {
    pub sport: Option<String>,
    #[serde(rename = "type")]
    pub alert_type: Option<String>,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertsResponse {
    pub alerts: Vec<ApiAlert>,
    pub total: usize,
    pub filters: AlertsFilters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SportCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SportsResponse {
    pub sports: Vec<SportCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(reason: &str, score: f64) -> AlertRecord {
        AlertRecord {
            id: 7,
            sport: "basketball".to_string(),
            league: "NBA".to_string(),
            event: "Lakers vs Celtics".to_string(),
            start_time_utc: None,
            market: "TOTAL".to_string(),
            line: Some(220.5),
            selection: "OVER".to_string(),
            bookmaker: "Bet365".to_string(),
            odds: 1.95,
            reason: reason.to_string(),
            score,
            message: None,
            created_at_utc: Utc::now(),
            sent_at_utc: None,
        }
    }

    #[test]
    fn test_filter_defaults() {
        let f = FilterState::default();
        assert_eq!(f.sport, Sport::All);
        assert_eq!(f.alert_type, AlertType::All);
        assert_eq!(f.market, MarketType::All);
        assert!(f.league.is_empty());
        assert_eq!(f.sent, None);
    }

    #[test]
    fn test_api_alert_from_ev_record() {
        let alert = ApiAlert::from(&record("EV", 0.054));
        assert_eq!(alert.id, "7");
        assert_eq!(alert.alert_type, ApiAlertType::Ev);
        assert!((alert.ev - 5.4).abs() < 1e-9);
        assert_eq!(alert.message, "");
    }

    #[test]
    fn test_api_alert_wire_names() {
        let alert = ApiAlert::from(&record("ANOMALY", 2.3));
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["type"], "anomalia");
        assert_eq!(json["match"], "Lakers vs Celtics");
        assert_eq!(json["ev"], 0.0);
        assert!(json.get("startTime").is_some());
        assert!(json.get("sentAt").is_some());
    }

    #[test]
    fn test_stats_wire_names() {
        let json = serde_json::to_value(StatsResponse::empty()).unwrap();
        assert_eq!(json["totalAlertas"], 0);
        assert_eq!(json["alertasEV"], 0);
        assert!(json.get("lastUpdate").is_some());
    }

    #[test]
    fn test_parse_filters() {
        assert_eq!("todas".parse::<Sport>().unwrap(), Sport::All);
        assert_eq!("Tennis".parse::<Sport>().unwrap(), Sport::Tennis);
        assert_eq!("ev+".parse::<AlertType>().unwrap(), AlertType::Ev);
        assert_eq!("1x2".parse::<MarketType>().unwrap(), MarketType::OneXTwo);
        assert!("corners".parse::<MarketType>().is_err());
    }
}
