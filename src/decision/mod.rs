//! Pricing models and alert decision logic

pub mod anomaly;
pub mod basketball_stats;
pub mod classifier;
pub mod devig;
pub mod error_detection;
pub mod ev;
pub mod football;
pub mod math;
pub mod quality;
pub mod robust_stats;
pub mod tennis;

pub use anomaly::{detect_anomalies, pick_z_score, AnomalyHit};
pub use basketball_stats::BasketballStatsEngine;
pub use classifier::{classify_pick, Classification, PickAction, PickSignals, PickType};
pub use error_detection::{scan_all_odds, ErrorDetection, ErrorHit};
pub use ev::{should_bet, EvCalculation, EvResult};
pub use quality::{apply_all_filters, QualityReport};
pub use robust_stats::RobustStatsEngine;

#[cfg(test)]
pub(crate) fn test_row(
    event_id: i64,
    market: &str,
    line: Option<f64>,
    bookmaker: &str,
    selection: &str,
    odds: f64,
) -> crate::types::OddsRow {
    crate::types::OddsRow {
        event_id,
        sport: "basketball".to_string(),
        league: "NBA".to_string(),
        start_time_utc: None,
        home: "Lakers".to_string(),
        away: "Celtics".to_string(),
        market: market.to_string(),
        line,
        bookmaker: bookmaker.to_string(),
        selection: selection.to_string(),
        odds,
        captured_at_utc: chrono::Utc::now(),
    }
}
