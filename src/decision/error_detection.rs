//! Detection of mispriced odds by deviation from the rest of the market

use crate::decision::basketball_stats::mean;
use crate::formatters::{fmt_line, fmt_odds, format_start_time};
use crate::types::{OddsPoint, OddsRow, Sport};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

pub const SIGMA_THRESHOLD_ERROR: f64 = 3.0;
pub const SIGMA_THRESHOLD_CRITICAL: f64 = 4.0;
pub const HISTORICAL_DEVIATION_THRESHOLD: f64 = 0.30;
pub const MIN_MARKET_SAMPLE: usize = 3;
pub const MIN_HISTORICAL_SAMPLE: usize = 5;
/// Errors below this confidence are not reported by a scan
pub const REPORT_CONFIDENCE: f64 = 0.7;
/// Minimum confidence for a Telegram error alert
pub const ACTIONABLE_CONFIDENCE: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    None,
    /// Price far above the market, likely a manual mistake in our favour
    HumanError,
    /// Price far below the market
    SystemError,
    /// Critical deviation but within plausible range
    LateUpdate,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::None => "NONE",
            ErrorType::HumanError => "HUMAN_ERROR",
            ErrorType::SystemError => "SYSTEM_ERROR",
            ErrorType::LateUpdate => "LATE_UPDATE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorAction {
    BetImmediately,
    Monitor,
    Skip,
}

impl ErrorAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorAction::BetImmediately => "BET_IMMEDIATELY",
            ErrorAction::Monitor => "MONITOR",
            ErrorAction::Skip => "SKIP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketDeviation {
    pub market_mean: f64,
    pub market_std: f64,
    pub market_min: f64,
    pub market_max: f64,
    pub deviation_sigmas: f64,
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalDeviation {
    pub historical_mean: f64,
    pub historical_std: f64,
    pub deviation_pct: f64,
    pub significant_deviation: bool,
    pub sample_size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsistencyCheck {
    pub inconsistent: bool,
    pub inconsistencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetection {
    pub is_error: bool,
    pub confidence: f64,
    pub error_type: ErrorType,
    pub expected_odd: Option<f64>,
    pub actual_odd: f64,
    pub deviation_sigmas: Option<f64>,
    pub action: ErrorAction,
    pub reasoning: Vec<String>,
    pub market_analysis: Option<MarketDeviation>,
    pub historical_analysis: Option<HistoricalDeviation>,
    pub consistency_check: ConsistencyCheck,
}

impl ErrorDetection {
    fn not_an_error(actual_odd: f64, reason: &str, market_analysis: Option<MarketDeviation>) -> Self {
        Self {
            is_error: false,
            confidence: 0.0,
            error_type: ErrorType::None,
            expected_odd: None,
            actual_odd,
            deviation_sigmas: None,
            action: ErrorAction::Skip,
            reasoning: vec![reason.to_string()],
            market_analysis,
            historical_analysis: None,
            consistency_check: ConsistencyCheck::default(),
        }
    }

    /// A human error priced above the market, flagged to bet now with high confidence
    pub fn is_actionable(&self) -> bool {
        if !self.is_error || self.error_type != ErrorType::HumanError {
            return false;
        }
        match self.expected_odd {
            Some(expected) if self.actual_odd > expected => {}
            _ => return false,
        }
        self.action == ErrorAction::BetImmediately && self.confidence >= ACTIONABLE_CONFIDENCE
    }
}

/// A snapshot row flagged as a pricing error
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorHit {
    pub row: OddsRow,
    pub detection: ErrorDetection,
}

/// Sample standard deviation, population for a single value
fn sample_std(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    (xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64).sqrt()
}

/// Deviation of `odd` from the other bookmakers quoting the same pick in the same event
pub fn analyze_market_deviation(odd: &OddsRow, snapshot: &[OddsRow]) -> Option<MarketDeviation> {
    let market_odds: Vec<f64> = snapshot
        .iter()
        .filter(|o| o.same_pick(odd) && o.bookmaker != odd.bookmaker)
        .map(|o| o.odds)
        .filter(|v| v.is_finite())
        .collect();

    if market_odds.len() < MIN_MARKET_SAMPLE {
        return None;
    }

    let market_mean = mean(&market_odds);
    let market_std = sample_std(&market_odds);
    if market_std == 0.0 || market_std.is_nan() {
        return None;
    }

    Some(MarketDeviation {
        market_mean,
        market_std,
        market_min: market_odds.iter().copied().fold(f64::INFINITY, f64::min),
        market_max: market_odds.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        deviation_sigmas: (odd.odds - market_mean).abs() / market_std,
        sample_size: market_odds.len(),
    })
}

/// Deviation of the current price from this pick's own price history
pub fn analyze_historical_deviation(odd: &OddsRow, history: &[OddsPoint]) -> Option<HistoricalDeviation> {
    let values: Vec<f64> = history
        .iter()
        .map(|p| p.odds)
        .filter(|v| v.is_finite())
        .collect();

    if values.len() < MIN_HISTORICAL_SAMPLE {
        return None;
    }

    let historical_mean = mean(&values);
    let deviation_pct = if historical_mean != 0.0 {
        (odd.odds - historical_mean).abs() / historical_mean
    } else {
        f64::INFINITY
    };

    Some(HistoricalDeviation {
        historical_mean,
        historical_std: sample_std(&values),
        deviation_pct,
        significant_deviation: deviation_pct > HISTORICAL_DEVIATION_THRESHOLD,
        sample_size: values.len(),
    })
}

/// Implied probabilities of opposite sides in the same event should sum close to one
pub fn check_market_consistency(odd: &OddsRow, snapshot: &[OddsRow]) -> ConsistencyCheck {
    let selection = odd.selection.as_str();
    let (opposite, upper_bound, same_line) = match odd.market.as_str() {
        "TOTAL" => (if selection == "OVER" { "UNDER" } else { "OVER" }, 1.20, true),
        "MONEYLINE" => (if selection == "HOME" { "AWAY" } else { "HOME" }, 1.15, false),
        _ => return ConsistencyCheck::default(),
    };

    let opposite_odds: Vec<f64> = snapshot
        .iter()
        .filter(|o| {
            o.event_id == odd.event_id
                && o.market == odd.market
                && o.selection == opposite
                && (!same_line || o.same_line(odd))
        })
        .map(|o| o.odds)
        .filter(|v| v.is_finite())
        .collect();

    let mut check = ConsistencyCheck::default();
    if opposite_odds.is_empty() {
        return check;
    }

    let avg_opposite = mean(&opposite_odds);
    let implied = |o: f64| if o > 0.0 { 1.0 / o } else { 0.0 };
    let total_prob = implied(odd.odds) + implied(avg_opposite);

    if !(0.95..=upper_bound).contains(&total_prob) {
        check.inconsistent = true;
        check
            .inconsistencies
            .push(format!("Probabilidades implícitas inconsistentes: {:.3}", total_prob));
    }
    check
}

pub fn detect_pricing_error(odd: &OddsRow, snapshot: &[OddsRow], history: &[OddsPoint]) -> ErrorDetection {
    let actual = odd.odds;
    if !actual.is_finite() {
        debug!("Invalid odds for error detection: {:?}", odd);
        return ErrorDetection::not_an_error(actual, "Odd inválida o incompleta", None);
    }

    let Some(market) = analyze_market_deviation(odd, snapshot) else {
        return ErrorDetection::not_an_error(
            actual,
            "Datos de mercado insuficientes para análisis estadístico",
            None,
        );
    };

    let sigmas = market.deviation_sigmas;
    let market_mean = market.market_mean;
    let historical = analyze_historical_deviation(odd, history);
    let history_confirms = historical
        .as_ref()
        .map(|h| h.significant_deviation)
        .unwrap_or(false);

    let mut reasoning = Vec::new();
    let mut confidence: f64 = if sigmas >= SIGMA_THRESHOLD_CRITICAL {
        0.6
    } else if sigmas >= SIGMA_THRESHOLD_ERROR {
        0.35
    } else {
        0.0
    };

    if historical.is_some() {
        confidence += if history_confirms { 0.25 } else { 0.05 };
    }

    let consistency = check_market_consistency(odd, snapshot);
    if consistency.inconsistent {
        confidence += 0.15;
        reasoning.extend(consistency.inconsistencies.iter().cloned());
    }
    confidence = confidence.min(1.0);

    let mut is_error = false;
    let mut error_type = ErrorType::None;
    let mut action = ErrorAction::Skip;

    if sigmas >= SIGMA_THRESHOLD_CRITICAL {
        is_error = true;
        if actual > market_mean * 1.5 {
            error_type = ErrorType::HumanError;
            action = ErrorAction::BetImmediately;
            reasoning.push("Odd muy alta respecto al mercado; puede ser error humano".to_string());
        } else if actual < market_mean * 0.7 {
            error_type = ErrorType::SystemError;
            reasoning.push("Odd muy baja respecto al mercado; posible error del sistema".to_string());
        } else {
            error_type = ErrorType::LateUpdate;
            action = ErrorAction::Monitor;
            reasoning.push(
                "Desviación crítica pero dentro de rangos, posible actualización tardía".to_string(),
            );
        }
    } else if sigmas >= SIGMA_THRESHOLD_ERROR {
        if history_confirms {
            is_error = true;
            error_type = ErrorType::HumanError;
            if actual > market_mean {
                action = ErrorAction::BetImmediately;
            }
            reasoning.push("Desviación significativa confirmada por histórico".to_string());
        } else {
            action = ErrorAction::Monitor;
            reasoning.push("Desviación significativa sin confirmación histórica; monitorear".to_string());
        }
    } else if consistency.inconsistent {
        confidence = confidence.max(0.2);
        action = ErrorAction::Monitor;
        reasoning.push("Inconsistencia de mercado detectada; revisar".to_string());
    }

    if is_error {
        confidence = confidence.max(0.6);
        if sigmas >= SIGMA_THRESHOLD_CRITICAL {
            confidence = confidence.max(0.8);
        }
    }

    reasoning.push(format!("Desviación en sigmas: {:.2}", sigmas));
    reasoning.push(format!(
        "Media mercado: {:.3}, Odd actual: {:.3}",
        market_mean, actual
    ));

    ErrorDetection {
        is_error,
        confidence: confidence.clamp(0.0, 1.0),
        error_type,
        expected_odd: Some(market_mean),
        actual_odd: actual,
        deviation_sigmas: Some(sigmas),
        action,
        reasoning,
        market_analysis: Some(market),
        historical_analysis: historical,
        consistency_check: consistency,
    }
}

/// Errors above the report confidence, most confident first.
/// `history_for` supplies each row's own price history.
pub fn scan_all_odds<F>(snapshot: &[OddsRow], mut history_for: F) -> Vec<ErrorHit>
where
    F: FnMut(&OddsRow) -> Vec<OddsPoint>,
{
    let mut hits: Vec<ErrorHit> = snapshot
        .iter()
        .filter_map(|row| {
            let detection = detect_pricing_error(row, snapshot, &history_for(row));
            (detection.is_error && detection.confidence > REPORT_CONFIDENCE).then(|| ErrorHit {
                row: row.clone(),
                detection,
            })
        })
        .collect();

    hits.sort_by(|a, b| {
        b.detection
            .confidence
            .partial_cmp(&a.detection.confidence)
            .unwrap_or(Ordering::Equal)
    });
    hits
}

fn sport_of(row: &OddsRow) -> Sport {
    row.sport.parse().unwrap_or(Sport::Basketball)
}

/// Detailed error report with reasoning
pub fn format_error_alert(row: &OddsRow, detection: &ErrorDetection) -> String {
    let mut lines = vec![
        "🚨 ERROR DE CUOTA DETECTADO 🚨".to_string(),
        String::new(),
        format!("{} {}", sport_of(row).emoji(), row.event_label()),
        format!("📊 {} {} {}", row.market, fmt_line(row.line), row.selection),
        format!("🏪 {}", row.bookmaker),
        String::new(),
        format!("💰 Cuota: {:.2}", detection.actual_odd),
    ];
    if let Some(expected) = detection.expected_odd {
        lines.push(format!("📈 Esperado: {:.2}", expected));
    }
    if let Some(sigmas) = detection.deviation_sigmas {
        lines.push(format!("📊 Desviación: {:.1}σ", sigmas));
    }
    lines.push(format!("🎯 Confianza: {:.0}%", detection.confidence * 100.0));
    lines.push(String::new());
    lines.push(format!("⚡ Acción: {}", detection.action.as_str()));
    lines.push(String::new());
    lines.push("Razonamiento:".to_string());
    lines.extend(detection.reasoning.iter().map(|r| format!("  • {}", r)));

    lines.join("\n")
}

/// Fixed-layout Telegram message for an actionable error
pub fn format_error_cuota_message(row: &OddsRow, detection: &ErrorDetection) -> String {
    let sport = sport_of(row);
    [
        format!("📊 ERROR DE CUOTA - {}", sport.label_es()),
        format!("🏆 {}", row.league),
        format!("{} {}", sport.emoji(), row.event_label()),
        format!("🕐 {}", format_start_time(row.start_time_utc)),
        format!("📊 Mercado: {}", row.market),
        format!(
            "🎲 {} {} @ {}",
            row.selection,
            fmt_line(row.line),
            fmt_odds(row.odds)
        ),
        format!("🏪 {}", row.bookmaker),
        format!("📈 Z-score: {:.2}", detection.deviation_sigmas.unwrap_or(0.0)),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::test_row;
    use chrono::{Duration, Utc};

    fn market(outlier: f64) -> Vec<OddsRow> {
        vec![
            test_row(1, "TOTAL", Some(220.5), "Bet365", "OVER", 1.90),
            test_row(1, "TOTAL", Some(220.5), "Pinnacle", "OVER", 1.92),
            test_row(1, "TOTAL", Some(220.5), "Bwin", "OVER", 1.88),
            test_row(1, "TOTAL", Some(220.5), "Betfair", "OVER", 1.91),
            test_row(1, "TOTAL", Some(220.5), "1xBet", "OVER", outlier),
        ]
    }

    fn history(odds: f64, n: usize) -> Vec<OddsPoint> {
        (0..n)
            .map(|i| OddsPoint {
                odds,
                captured_at_utc: Utc::now() - Duration::minutes(i as i64),
            })
            .collect()
    }

    #[test]
    fn test_human_error_is_actionable() {
        let rows = market(3.50);
        let detection = detect_pricing_error(&rows[4], &rows, &[]);
        assert!(detection.is_error);
        assert_eq!(detection.error_type, ErrorType::HumanError);
        assert_eq!(detection.action, ErrorAction::BetImmediately);
        assert!(detection.confidence >= 0.8);
        assert!(detection.is_actionable());
    }

    #[test]
    fn test_confidence_capped_with_history() {
        let rows = market(3.50);
        let detection = detect_pricing_error(&rows[4], &rows, &history(1.9, 6));
        assert!(detection.is_error);
        assert!(detection.confidence >= 0.8);
        assert!(detection.confidence <= 1.0);
    }

    #[test]
    fn test_system_error_not_actionable() {
        let rows = market(1.10);
        let detection = detect_pricing_error(&rows[4], &rows, &[]);
        assert_eq!(detection.error_type, ErrorType::SystemError);
        assert_eq!(detection.action, ErrorAction::Skip);
        assert!(!detection.is_actionable());
    }

    #[test]
    fn test_insufficient_market() {
        let rows = market(3.5)[2..].to_vec();
        let detection = detect_pricing_error(&rows[2], &rows, &[]);
        assert!(!detection.is_error);
        assert!(detection.market_analysis.is_none());
    }

    #[test]
    fn test_other_events_ignored() {
        let mut rows = market(3.5);
        for row in rows.iter_mut().take(3) {
            row.event_id = 2;
        }
        assert!(analyze_market_deviation(&rows[4], &rows).is_none());
    }

    #[test]
    fn test_historical_confirmation() {
        let rows = market(2.0);
        let hist = analyze_historical_deviation(&rows[4], &history(1.4, 5)).unwrap();
        assert!(hist.significant_deviation);
        assert!(analyze_historical_deviation(&rows[4], &history(1.4, 4)).is_none());
    }

    #[test]
    fn test_consistency() {
        let rows = vec![
            test_row(1, "TOTAL", Some(220.5), "Bet365", "OVER", 3.0),
            test_row(1, "TOTAL", Some(220.5), "Bet365", "UNDER", 3.0),
        ];
        let check = check_market_consistency(&rows[0], &rows);
        assert!(check.inconsistent);
        assert!(check.inconsistencies[0].contains("0.667"));

        let fair = vec![
            test_row(1, "TOTAL", Some(220.5), "Bet365", "OVER", 1.9),
            test_row(1, "TOTAL", Some(220.5), "Bet365", "UNDER", 1.9),
        ];
        assert!(!check_market_consistency(&fair[0], &fair).inconsistent);
    }

    #[test]
    fn test_scan_orders_by_confidence() {
        let rows = market(3.5);
        let hits = scan_all_odds(&rows, |_| Vec::new());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].row.bookmaker, "1xBet");

        let text = format_error_cuota_message(&hits[0].row, &hits[0].detection);
        assert!(text.starts_with("📊 ERROR DE CUOTA - BALONCESTO"));
        assert!(text.contains("🎲 OVER 220.5 @ 3.5"));
        let alert = format_error_alert(&hits[0].row, &hits[0].detection);
        assert!(alert.contains("⚡ Acción: BET_IMMEDIATELY"));
    }
}
