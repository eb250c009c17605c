//! Filter evaluation and the option catalogs shown in the filter bar

use super::types::{AlertType, ApiAlert, ApiAlertType, FilterState, MarketType, Sport};

/// A selectable filter value with its label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOption {
    pub value: &'static str,
    pub label: &'static str,
    pub emoji: Option<&'static str>,
}

const fn option(value: &'static str, label: &'static str) -> FilterOption {
    FilterOption {
        value,
        label,
        emoji: None,
    }
}

pub const SPORT_OPTIONS: [FilterOption; 4] = [
    FilterOption { value: "all", label: "Todos los Deportes", emoji: Some("🎯") },
    FilterOption { value: "basketball", label: "Basketball", emoji: Some("🏀") },
    FilterOption { value: "football", label: "Football", emoji: Some("⚽") },
    FilterOption { value: "tennis", label: "Tennis", emoji: Some("🎾") },
];

pub const ALERT_TYPE_OPTIONS: [FilterOption; 3] = [
    option("all", "Todos los Tipos"),
    option("ev", "Expected Value"),
    option("anomaly", "Anomalías"),
];

pub const MARKET_OPTIONS: [FilterOption; 6] = [
    option("all", "Todos los Mercados"),
    option("TOTAL", "Total Puntos"),
    option("SPREAD", "Spread"),
    option("MONEYLINE", "Moneyline"),
    option("1X2", "1X2"),
    option("BTTS", "Ambos Anotan"),
];

pub const STATUS_OPTIONS: [FilterOption; 3] = [
    option("all", "Todas"),
    option("sent", "Enviadas"),
    option("pending", "Pendientes"),
];

impl FilterOption {
    /// Label with the emoji prefix when there is one
    pub fn display(&self) -> String {
        match self.emoji {
            Some(emoji) => format!("{} {}", emoji, self.label),
            None => self.label.to_string(),
        }
    }
}

/// Status select value for a `sent` filter
pub fn status_value(sent: Option<bool>) -> &'static str {
    match sent {
        None => "all",
        Some(true) => "sent",
        Some(false) => "pending",
    }
}

/// Inverse of [`status_value`]; unknown values clear the filter
pub fn parse_status(value: &str) -> Option<bool> {
    match value {
        "sent" => Some(true),
        "pending" => Some(false),
        _ => None,
    }
}

impl FilterState {
    /// Number of filters that narrow the list
    pub fn active_filters_count(&self) -> usize {
        [
            self.sport != Sport::All,
            self.alert_type != AlertType::All,
            self.market != MarketType::All,
            !self.league.is_empty(),
            self.sent.is_some(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    pub fn reset(&mut self) {
        *self = FilterState::default();
    }

    pub fn matches(&self, alert: &ApiAlert) -> bool {
        if self.sport != Sport::All && !alert.sport.eq_ignore_ascii_case(self.sport.as_str()) {
            return false;
        }

        let type_ok = match self.alert_type {
            AlertType::All => true,
            AlertType::Ev => alert.alert_type == ApiAlertType::Ev,
            AlertType::Anomaly => alert.alert_type == ApiAlertType::Anomalia,
        };
        if !type_ok {
            return false;
        }

        if self.market != MarketType::All && !alert.market.eq_ignore_ascii_case(self.market.as_str()) {
            return false;
        }

        if !self.league.is_empty()
            && !alert
                .league
                .to_lowercase()
                .contains(&self.league.to_lowercase())
        {
            return false;
        }

        match self.sent {
            Some(true) => alert.sent_at.is_some(),
            Some(false) => alert.sent_at.is_none(),
            None => true,
        }
    }

    pub fn apply(&self, alerts: &[ApiAlert]) -> Vec<ApiAlert> {
        alerts.iter().filter(|a| self.matches(a)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn alert(sport: &str, kind: ApiAlertType, market: &str, league: &str, sent: bool) -> ApiAlert {
        ApiAlert {
            id: "1".to_string(),
            sport: sport.to_string(),
            league: league.to_string(),
            match_name: "A vs B".to_string(),
            market: market.to_string(),
            line: None,
            selection: "HOME".to_string(),
            odds: 2.1,
            bookmaker: "Bet365".to_string(),
            message: String::new(),
            alert_type: kind,
            ev: 0.0,
            score: 0.0,
            timestamp: Utc::now(),
            start_time: None,
            sent_at: sent.then(Utc::now),
        }
    }

    fn sample() -> Vec<ApiAlert> {
        vec![
            alert("basketball", ApiAlertType::Ev, "TOTAL", "NBA", true),
            alert("Football", ApiAlertType::Anomalia, "1X2", "Premier League", false),
            alert("tennis", ApiAlertType::Ev, "moneyline", "ATP", false),
        ]
    }

    #[test]
    fn test_active_count_and_reset() {
        let mut f = FilterState::default();
        assert_eq!(f.active_filters_count(), 0);

        f.sport = Sport::Football;
        f.league = "prem".to_string();
        f.sent = Some(false);
        assert_eq!(f.active_filters_count(), 3);

        f.reset();
        assert_eq!(f, FilterState::default());
    }

    #[test]
    fn test_sport_is_case_insensitive() {
        let f = FilterState {
            sport: Sport::Football,
            ..Default::default()
        };
        assert_eq!(f.apply(&sample()).len(), 1);
    }

    #[test]
    fn test_type_market_league() {
        let ev = FilterState {
            alert_type: AlertType::Ev,
            ..Default::default()
        };
        assert_eq!(ev.apply(&sample()).len(), 2);

        let ml = FilterState {
            market: MarketType::Moneyline,
            ..Default::default()
        };
        assert_eq!(ml.apply(&sample())[0].league, "ATP");

        let league = FilterState {
            league: "LEAGUE".to_string(),
            ..Default::default()
        };
        assert_eq!(league.apply(&sample())[0].sport, "Football");
    }

    #[test]
    fn test_sent_filter() {
        let sent = FilterState {
            sent: Some(true),
            ..Default::default()
        };
        let pending = FilterState {
            sent: Some(false),
            ..Default::default()
        };
        assert_eq!(sent.apply(&sample()).len(), 1);
        assert_eq!(pending.apply(&sample()).len(), 2);
    }

    #[test]
    fn test_catalogs() {
        assert_eq!(SPORT_OPTIONS[0].display(), "🎯 Todos los Deportes");
        assert_eq!(MARKET_OPTIONS[5].label, "Ambos Anotan");
        assert_eq!(status_value(Some(false)), "pending");
        assert_eq!(parse_status("sent"), Some(true));
        assert_eq!(parse_status("all"), None);
    }
}
