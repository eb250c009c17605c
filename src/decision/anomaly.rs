//! Z-score outliers across bookmakers quoting the same pick

use crate::types::{group_rows, OddsRow};

pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;
pub const DEFAULT_MIN_BOOKS: usize = 3;

/// A price that sits away from the rest of the market
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyHit {
    pub row: OddsRow,
    /// Negative when the price is higher than the market (lower implied probability)
    pub z: f64,
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation
fn stdev(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    (xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64).sqrt()
}

/// Valid rows of one pick group with their z-scores, empty when the group is
/// too small or flat
fn score_group<'a>(items: &[&'a OddsRow], min_books: usize) -> Vec<(&'a OddsRow, f64)> {
    let valid: Vec<&OddsRow> = items.iter().copied().filter(|r| r.odds > 1.0).collect();
    if items.len() < min_books || valid.len() < min_books {
        return Vec::new();
    }

    let probs: Vec<f64> = valid.iter().map(|r| 1.0 / r.odds).collect();
    let m = mean(&probs);
    let s = stdev(&probs);
    if s <= 1e-9 {
        return Vec::new();
    }

    valid.into_iter().map(|r| (r, (1.0 / r.odds - m) / s)).collect()
}

/// Every valid row with its z-score inside its (event, market, line, selection) group
fn score_groups(rows: &[OddsRow], min_books: usize) -> Vec<(&OddsRow, f64)> {
    group_rows(rows, OddsRow::pick_key)
        .iter()
        .flat_map(|items| score_group(items, min_books))
        .collect()
}

/// Rows whose implied probability deviates by at least `z_threshold` sigmas
pub fn detect_anomalies(rows: &[OddsRow], z_threshold: f64, min_books: usize) -> Vec<AnomalyHit> {
    score_groups(rows, min_books)
        .into_iter()
        .filter(|(_, z)| z.abs() >= z_threshold)
        .map(|(row, z)| AnomalyHit { row: row.clone(), z })
        .collect()
}

/// Z-score of one price against its group, if the group is large enough
pub fn pick_z_score(target: &OddsRow, rows: &[OddsRow], min_books: usize) -> Option<f64> {
    let group: Vec<&OddsRow> = rows.iter().filter(|r| r.same_pick(target)).collect();
    score_group(&group, min_books)
        .into_iter()
        .find(|(row, _)| *row == target)
        .map(|(_, z)| z)
}
