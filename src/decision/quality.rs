//! Pre-alert quality checks: liquidity, price stability, sharp agreement, volume

use crate::decision::basketball_stats::mean;
use crate::types::{OddsPoint, OddsRow};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

pub const SHARP_BOOKMAKERS: &[&str] = &[
    "Pinnacle",
    "Betfair",
    "Bet365",
    "Bookmaker.eu",
    "SBObet",
    "IBC",
    "Singbet",
];

pub const SOFT_BOOKMAKERS: &[&str] = &[
    "Bwin",
    "1xBet",
    "Betsson",
    "Codere",
    "William Hill",
    "Ladbrokes",
    "Coral",
    "Paddy Power",
];

pub const MIN_QUALITY_SCORE: f64 = 0.70;

const LIQUIDITY_WEIGHT: f64 = 0.30;
const STABILITY_WEIGHT: f64 = 0.25;
const SHARP_WEIGHT: f64 = 0.30;
const VOLUME_WEIGHT: f64 = 0.15;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidityCheck {
    pub passed: bool,
    pub bookmaker_count: usize,
    pub bookmakers: Vec<String>,
    pub score: f64,
    pub min_required: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityCheck {
    pub passed: bool,
    pub variation: f64,
    pub min_odd: Option<f64>,
    pub max_odd: Option<f64>,
    pub avg_odd: Option<f64>,
    pub samples: usize,
    pub score: f64,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharpCheck {
    pub passed: bool,
    pub sharp_odds: Vec<f64>,
    pub sharp_avg: Option<f64>,
    pub deviation: Option<f64>,
    pub score: f64,
    pub reason: Option<String>,
}

impl SharpCheck {
    pub fn sharp_count(&self) -> usize {
        self.sharp_odds.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeCheck {
    pub passed: bool,
    pub total_bookmakers: usize,
    pub sharp_count: usize,
    pub soft_count: usize,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityRecommendation {
    StrongBet,
    ModerateBet,
    WeakBet,
    Skip,
}

impl QualityRecommendation {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            QualityRecommendation::StrongBet
        } else if score >= 0.70 {
            QualityRecommendation::ModerateBet
        } else if score >= 0.50 {
            QualityRecommendation::WeakBet
        } else {
            QualityRecommendation::Skip
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityRecommendation::StrongBet => "STRONG_BET",
            QualityRecommendation::ModerateBet => "MODERATE_BET",
            QualityRecommendation::WeakBet => "WEAK_BET",
            QualityRecommendation::Skip => "SKIP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub passed: bool,
    pub quality_score: f64,
    pub liquidity: LiquidityCheck,
    pub stability: StabilityCheck,
    pub sharp_books: SharpCheck,
    pub volume: VolumeCheck,
    pub recommendation: QualityRecommendation,
}

/// Distinct bookmakers quoting the same pick
pub fn check_liquidity(odd: &OddsRow, snapshot: &[OddsRow], min_bookmakers: usize) -> LiquidityCheck {
    let bookmakers: BTreeSet<&str> = snapshot
        .iter()
        .filter(|o| o.same_pick(odd))
        .map(|o| o.bookmaker.as_str())
        .collect();
    let count = bookmakers.len();

    LiquidityCheck {
        passed: count >= min_bookmakers,
        bookmaker_count: count,
        bookmakers: bookmakers.into_iter().map(String::from).collect(),
        score: (count as f64 / (min_bookmakers * 2) as f64).min(1.0),
        min_required: min_bookmakers,
    }
}

/// Relative spread of this bookmaker's prices over the recent window
pub fn check_stability(history: &[OddsPoint], max_variation: f64, window_minutes: i64) -> StabilityCheck {
    let unstable = |reason: &str| StabilityCheck {
        passed: false,
        variation: 0.0,
        min_odd: None,
        max_odd: None,
        avg_odd: None,
        samples: 0,
        score: 0.0,
        reason: Some(reason.to_string()),
    };

    if history.is_empty() {
        return unstable("No historical data");
    }

    let cutoff = Utc::now() - Duration::minutes(window_minutes);
    let recent: Vec<f64> = history
        .iter()
        .filter(|p| p.captured_at_utc >= cutoff)
        .map(|p| p.odds)
        .collect();

    if recent.len() < 2 {
        return unstable("Insufficient historical data");
    }

    let min = recent.iter().copied().fold(f64::INFINITY, f64::min);
    let max = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let variation = if min > 0.0 { (max - min) / min } else { 1.0 };

    StabilityCheck {
        passed: variation <= max_variation,
        variation,
        min_odd: Some(min),
        max_odd: Some(max),
        avg_odd: Some(mean(&recent)),
        samples: recent.len(),
        score: (1.0 - variation / max_variation).max(0.0),
        reason: None,
    }
}

/// Distance of this price from the sharp-book average for the same pick
pub fn check_sharp_books(odd: &OddsRow, snapshot: &[OddsRow], tolerance: f64) -> SharpCheck {
    let sharp_odds: Vec<f64> = snapshot
        .iter()
        .filter(|o| SHARP_BOOKMAKERS.contains(&o.bookmaker.as_str()) && o.same_pick(odd))
        .map(|o| o.odds)
        .collect();

    if sharp_odds.is_empty() {
        return SharpCheck {
            passed: false,
            sharp_odds,
            sharp_avg: None,
            deviation: None,
            score: 0.0,
            reason: Some("No sharp bookmakers found".to_string()),
        };
    }

    let avg = mean(&sharp_odds);
    let deviation = if avg > 0.0 { (odd.odds - avg).abs() / avg } else { 1.0 };

    SharpCheck {
        passed: deviation <= tolerance,
        sharp_odds,
        sharp_avg: Some(avg),
        deviation: Some(deviation),
        score: (1.0 - deviation / tolerance).max(0.0),
        reason: None,
    }
}

/// Bookmaker coverage across every market of the given rows
pub fn check_volume(rows: &[OddsRow], min_total_bookmakers: usize) -> VolumeCheck {
    let bookmakers: BTreeSet<&str> = rows.iter().map(|o| o.bookmaker.as_str()).collect();
    let total = bookmakers.len();

    VolumeCheck {
        passed: total >= min_total_bookmakers,
        total_bookmakers: total,
        sharp_count: bookmakers.iter().filter(|b| SHARP_BOOKMAKERS.contains(b)).count(),
        soft_count: bookmakers.iter().filter(|b| SOFT_BOOKMAKERS.contains(b)).count(),
        score: (total as f64 / (min_total_bookmakers * 2) as f64).min(1.0),
    }
}

/// Weighted quality score over all four checks. Volume counts only the pick's own event.
pub fn apply_all_filters(
    odd: &OddsRow,
    snapshot: &[OddsRow],
    history: &[OddsPoint],
    min_quality_score: f64,
) -> QualityReport {
    let liquidity = check_liquidity(odd, snapshot, 3);
    let stability = check_stability(history, 0.05, 60);
    let sharp_books = check_sharp_books(odd, snapshot, 0.10);

    let event_rows: Vec<OddsRow> = snapshot
        .iter()
        .filter(|o| o.event_id == odd.event_id)
        .cloned()
        .collect();
    let volume = check_volume(&event_rows, 5);

    let quality_score = liquidity.score * LIQUIDITY_WEIGHT
        + stability.score * STABILITY_WEIGHT
        + sharp_books.score * SHARP_WEIGHT
        + volume.score * VOLUME_WEIGHT;

    QualityReport {
        passed: quality_score >= min_quality_score,
        quality_score,
        liquidity,
        stability,
        sharp_books,
        volume,
        recommendation: QualityRecommendation::from_score(quality_score),
    }
}

pub fn quality_summary(report: &QualityReport) -> String {
    format!(
        "📊 Calidad: {:.0}% ({})\n\
         ├─ Liquidez: {} bookmakers\n\
         ├─ Estabilidad: {:.1}% variación\n\
         ├─ Sharp books: {} confirmaciones\n\
         └─ Volumen: {} bookmakers totales\n",
        report.quality_score * 100.0,
        report.recommendation.as_str(),
        report.liquidity.bookmaker_count,
        report.stability.variation * 100.0,
        report.sharp_books.sharp_count(),
        report.volume.total_bookmakers,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::test_row;

    fn snapshot() -> Vec<OddsRow> {
        vec![
            test_row(1, "TOTAL", Some(228.5), "Bwin", "OVER", 1.90),
            test_row(1, "TOTAL", Some(228.5), "Bet365", "OVER", 1.92),
            test_row(1, "TOTAL", Some(228.5), "Pinnacle", "OVER", 1.88),
            test_row(1, "TOTAL", Some(228.5), "Betfair", "OVER", 1.91),
            test_row(1, "TOTAL", Some(228.5), "1xBet", "OVER", 1.95),
            // other event, same market
            test_row(2, "TOTAL", Some(228.5), "Codere", "OVER", 1.80),
        ]
    }

    fn history(prices: &[f64]) -> Vec<OddsPoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, odds)| OddsPoint {
                odds: *odds,
                captured_at_utc: Utc::now() - Duration::minutes(i as i64 * 10),
            })
            .collect()
    }

    #[test]
    fn test_liquidity_scoped_to_event() {
        let rows = snapshot();
        let check = check_liquidity(&rows[0], &rows, 3);
        assert!(check.passed);
        assert_eq!(check.bookmaker_count, 5);
        assert!(!check.bookmakers.contains(&"Codere".to_string()));
        assert!((check.score - 5.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_stability() {
        let stable = check_stability(&history(&[1.90, 1.92, 1.91]), 0.05, 60);
        assert!(stable.passed);
        assert_eq!(stable.samples, 3);

        let moved = check_stability(&history(&[1.90, 2.10]), 0.05, 60);
        assert!(!moved.passed);
        assert!(moved.score.abs() < 1e-9);

        let empty = check_stability(&[], 0.05, 60);
        assert_eq!(empty.reason.as_deref(), Some("No historical data"));

        let old = check_stability(&history(&[1.9, 1.9, 1.9, 1.9, 1.9, 1.9, 1.9, 1.9]), 0.05, 5);
        assert_eq!(old.reason.as_deref(), Some("Insufficient historical data"));
    }

    #[test]
    fn test_sharp_books() {
        let rows = snapshot();
        let check = check_sharp_books(&rows[0], &rows, 0.10);
        assert_eq!(check.sharp_count(), 3);
        assert!(check.passed);
        assert!((check.sharp_avg.unwrap() - 1.90333).abs() < 1e-4);

        let lonely = vec![test_row(1, "TOTAL", Some(228.5), "Bwin", "OVER", 1.9)];
        assert!(!check_sharp_books(&lonely[0], &lonely, 0.10).passed);
    }

    #[test]
    fn test_apply_all_filters() {
        let rows = snapshot();
        let report = apply_all_filters(&rows[0], &rows, &history(&[1.90, 1.90, 1.91]), MIN_QUALITY_SCORE);
        assert_eq!(report.volume.total_bookmakers, 5);
        assert_eq!(report.volume.sharp_count, 3);
        assert!(report.passed);
        assert!(report.quality_score > 0.7);

        let no_history = apply_all_filters(&rows[0], &rows, &[], MIN_QUALITY_SCORE);
        assert!(no_history.quality_score < report.quality_score);
        assert!(quality_summary(&report).contains("Liquidez: 5 bookmakers"));
    }

    #[test]
    fn test_recommendation_bands() {
        assert_eq!(QualityRecommendation::from_score(0.9), QualityRecommendation::StrongBet);
        assert_eq!(QualityRecommendation::from_score(0.7), QualityRecommendation::ModerateBet);
        assert_eq!(QualityRecommendation::from_score(0.49), QualityRecommendation::Skip);
    }
}
