//! Margin removal for bookmaker odds

use crate::types::{group_rows, line_key, OddsRow};

/// How the overround is redistributed across outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevigMethod {
    #[default]
    Multiplicative,
    Additive,
    Power,
}

const POWER_K: f64 = 1.5;
const ADDITIVE_FLOOR: f64 = 0.01;

/// Remove the margin from a set of odds.
///
/// Odds <= 1 are dropped before devigging, so the result only lines up with
/// the input when every price was valid. Fewer than two valid prices, or a
/// book without overround, returns the input unchanged.
pub fn devig_odds(odds: &[f64], method: DevigMethod) -> Vec<f64> {
    if odds.len() < 2 {
        return odds.to_vec();
    }

    let valid: Vec<f64> = odds.iter().copied().filter(|o| *o > 1.0).collect();
    if valid.len() < 2 {
        return odds.to_vec();
    }

    match method {
        DevigMethod::Multiplicative => devig_multiplicative(&valid),
        DevigMethod::Additive => devig_additive(&valid),
        DevigMethod::Power => devig_power(&valid, POWER_K),
    }
}

fn overround(odds: &[f64]) -> f64 {
    odds.iter().map(|o| 1.0 / o).sum()
}

fn devig_multiplicative(odds: &[f64]) -> Vec<f64> {
    let total = overround(odds);
    if total <= 1.0 {
        return odds.to_vec();
    }
    odds.iter()
        .map(|&o| {
            let p = (1.0 / o) / total;
            if p > 0.0 {
                1.0 / p
            } else {
                o
            }
        })
        .collect()
}

fn devig_additive(odds: &[f64]) -> Vec<f64> {
    let total = overround(odds);
    if total <= 1.0 {
        return odds.to_vec();
    }
    let per_outcome = (total - 1.0) / odds.len() as f64;
    odds.iter()
        .map(|&o| 1.0 / (1.0 / o - per_outcome).max(ADDITIVE_FLOOR))
        .collect()
}

fn devig_power(odds: &[f64], k: f64) -> Vec<f64> {
    if overround(odds) <= 1.0 {
        return odds.to_vec();
    }
    let adjusted: Vec<f64> = odds.iter().map(|o| (1.0 / o).powf(k)).collect();
    let total: f64 = adjusted.iter().sum();
    adjusted
        .iter()
        .zip(odds)
        .map(|(p, &o)| {
            let p = p / total;
            if p > 0.0 {
                1.0 / p
            } else {
                o
            }
        })
        .collect()
}

/// A snapshot row with its margin-free price
#[derive(Debug, Clone, PartialEq)]
pub struct DeviggedRow {
    pub row: OddsRow,
    pub odds_devigged: f64,
    /// "none" for single-price groups, otherwise "multiplicative"
    pub method: &'static str,
    pub original_odds: Option<f64>,
    pub margin_removed: Option<f64>,
}

/// Devig every (market, line, selection) group in a snapshot
pub fn devig_market(rows: &[OddsRow]) -> Vec<DeviggedRow> {
    let groups = group_rows(rows, |r| (r.market.as_str(), line_key(r.line), r.selection.as_str()));

    let mut out = Vec::with_capacity(rows.len());
    for group in groups {
        if group.len() < 2 {
            out.extend(group.into_iter().map(|r| DeviggedRow {
                row: r.clone(),
                odds_devigged: r.odds,
                method: "none",
                original_odds: None,
                margin_removed: None,
            }));
            continue;
        }

        let prices: Vec<f64> = group.iter().map(|r| r.odds).collect();
        let devigged = devig_odds(&prices, DevigMethod::Multiplicative);
        out.extend(group.into_iter().zip(devigged).map(|(r, fair)| DeviggedRow {
            row: r.clone(),
            odds_devigged: fair,
            method: "multiplicative",
            original_odds: Some(r.odds),
            margin_removed: Some(r.odds - fair),
        }));
    }
    out
}

/// Overround of a set of prices, never negative
pub fn calculate_market_margin(odds: &[f64]) -> f64 {
    if odds.len() < 2 {
        return 0.0;
    }
    let total: f64 = odds.iter().filter(|o| **o > 1.0).map(|o| 1.0 / o).sum();
    (total - 1.0).max(0.0)
}

/// Mean of the devigged prices
pub fn get_fair_odds(odds: &[f64]) -> f64 {
    let devigged = devig_odds(odds, DevigMethod::Multiplicative);
    if devigged.is_empty() {
        return 0.0;
    }
    devigged.iter().sum::<f64>() / devigged.len() as f64
}
