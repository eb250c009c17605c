//! Poisson goal models for football markets

use crate::decision::math::{expected_value, poisson_pmf};
use crate::sports::{sport_config, MarketParams};
use crate::types::{OddsRow, Sport};
use serde::Serialize;

pub const MAX_GOALS: u32 = 10;
pub const HOME_ADVANTAGE: f64 = 1.15;
pub const FORM_WEIGHT: f64 = 0.3;
pub const DIXON_COLES_RHO: f64 = -0.15;

/// Full-time result probabilities
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchProbabilities {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl MatchProbabilities {
    /// Lookup by HOME / DRAW / AWAY selection
    pub fn get(&self, selection: &str) -> Option<f64> {
        match selection.to_uppercase().as_str() {
            "HOME" => Some(self.home),
            "DRAW" => Some(self.draw),
            "AWAY" => Some(self.away),
            _ => None,
        }
    }
}

/// Independent Poisson scorelines up to `max_goals` each
pub fn match_probabilities(lambda_home: f64, lambda_away: f64, max_goals: u32) -> MatchProbabilities {
    let mut probs = MatchProbabilities {
        home: 0.0,
        draw: 0.0,
        away: 0.0,
    };

    for h in 0..=max_goals {
        let ph = poisson_pmf(h, lambda_home);
        for a in 0..=max_goals {
            let p = ph * poisson_pmf(a, lambda_away);
            if h > a {
                probs.home += p;
            } else if h == a {
                probs.draw += p;
            } else {
                probs.away += p;
            }
        }
    }

    probs
}

/// P(total goals > line) = 1 - P(total <= floor(line))
pub fn prob_over_goals(lambda_home: f64, lambda_away: f64, line: f64) -> f64 {
    let lambda_total = lambda_home + lambda_away;
    if line < 0.0 {
        return 1.0;
    }
    let k_max = line.floor() as u32;
    let under: f64 = (0..=k_max).map(|k| poisson_pmf(k, lambda_total)).sum();
    1.0 - under
}

pub fn prob_btts(lambda_home: f64, lambda_away: f64) -> f64 {
    let home_zero = (-lambda_home).exp();
    let away_zero = (-lambda_away).exp();
    1.0 - (home_zero + away_zero - home_zero * away_zero)
}

fn league_lambdas(league: &str) -> Option<(f64, f64)> {
    match sport_config(Sport::Football, league, "goals").ok()? {
        MarketParams::Goals {
            lambda_home,
            lambda_away,
            ..
        } => Some((lambda_home, lambda_away)),
        _ => None,
    }
}

/// Model probability of the row's selection from league baselines.
/// None for unconfigured leagues or selections the market does not have.
pub fn model_probability(row: &OddsRow) -> Option<f64> {
    let market = row.market.to_uppercase();
    let selection = row.selection.to_uppercase();

    match market.as_str() {
        "1X2" => {
            let (lh, la) = league_lambdas(&row.league)?;
            match_probabilities(lh, la, MAX_GOALS).get(&selection)
        }
        "TOTAL" | "GOALS" => {
            let (lh, la) = league_lambdas(&row.league)?;
            let line = row.line?;
            let over = prob_over_goals(lh, la, line);
            match selection.as_str() {
                "OVER" => Some(over),
                "UNDER" => Some(1.0 - over),
                _ => None,
            }
        }
        "BTTS" => {
            let prob_yes = match sport_config(Sport::Football, &row.league, "btts").ok()? {
                MarketParams::Btts {
                    prob_baseline: Some(p),
                    ..
                } => p,
                _ => {
                    let (lh, la) = league_lambdas(&row.league)?;
                    prob_btts(lh, la)
                }
            };
            match selection.as_str() {
                "YES" => Some(prob_yes),
                "NO" => Some(1.0 - prob_yes),
                _ => None,
            }
        }
        _ => None,
    }
}

pub fn ev_1x2(row: &OddsRow) -> Option<f64> {
    if row.market.to_uppercase() != "1X2" {
        return None;
    }
    model_probability(row).map(|p| expected_value(p, row.odds))
}

pub fn ev_goals(row: &OddsRow) -> Option<f64> {
    if !matches!(row.market.to_uppercase().as_str(), "TOTAL" | "GOALS") {
        return None;
    }
    model_probability(row).map(|p| expected_value(p, row.odds))
}

pub fn ev_btts(row: &OddsRow) -> Option<f64> {
    if row.market.to_uppercase() != "BTTS" {
        return None;
    }
    model_probability(row).map(|p| expected_value(p, row.odds))
}

/// Scale home scoring up and away scoring down by `factor`
pub fn adjust_for_home_advantage(lambda_home: f64, lambda_away: f64, factor: f64) -> (f64, f64) {
    (lambda_home * factor, lambda_away / factor)
}

/// Blend a baseline lambda with the recent scoring average
pub fn adjust_for_form(lambda_base: f64, recent_goals_scored: &[u32], weight: f64) -> f64 {
    if recent_goals_scored.is_empty() {
        return lambda_base;
    }
    let avg = recent_goals_scored.iter().map(|g| *g as f64).sum::<f64>()
        / recent_goals_scored.len() as f64;
    (1.0 - weight) * lambda_base + weight * avg
}

/// Dixon-Coles corrected probabilities for the four low scorelines, keyed "h-a"
pub fn dixon_coles(lambda_home: f64, lambda_away: f64, rho: f64) -> Vec<(String, f64)> {
    let mut out = Vec::with_capacity(4);
    for h in 0..2u32 {
        for a in 0..2u32 {
            let base = poisson_pmf(h, lambda_home) * poisson_pmf(a, lambda_away);
            let tau = match (h, a) {
                (0, 0) => 1.0 - lambda_home * lambda_away * rho,
                (0, 1) => 1.0 + lambda_home * rho,
                (1, 0) => 1.0 + lambda_away * rho,
                _ => 1.0 - rho,
            };
            out.push((format!("{}-{}", h, a), base * tau));
        }
    }
    out
}

fn fair(p: f64) -> f64 {
    if p > 0.0 {
        1.0 / p
    } else {
        999.0
    }
}

/// Margin-free 1X2 prices implied by the model
pub fn fair_odds_1x2(lambda_home: f64, lambda_away: f64) -> MatchProbabilities {
    let p = match_probabilities(lambda_home, lambda_away, MAX_GOALS);
    MatchProbabilities {
        home: fair(p.home),
        draw: fair(p.draw),
        away: fair(p.away),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeValue {
    pub outcome: &'static str,
    pub market_odds: f64,
    pub fair_odds: f64,
    pub probability: f64,
    pub ev: f64,
    pub value_pct: f64,
}

/// Compare quoted 1X2 prices against model prices. Missing quotes are skipped.
pub fn compare_odds_to_fair(
    market_odds: &[(&str, f64)],
    lambda_home: f64,
    lambda_away: f64,
) -> Vec<OutcomeValue> {
    let probs = match_probabilities(lambda_home, lambda_away, MAX_GOALS);
    let fair_odds = fair_odds_1x2(lambda_home, lambda_away);

    ["HOME", "DRAW", "AWAY"]
        .into_iter()
        .filter_map(|outcome| {
            let (_, market_odd) = market_odds
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(outcome))?;
            let probability = probs.get(outcome)?;
            let fair_odd = fair_odds.get(outcome)?;
            Some(OutcomeValue {
                outcome,
                market_odds: *market_odd,
                fair_odds: fair_odd,
                probability,
                ev: expected_value(probability, *market_odd),
                value_pct: (market_odd / fair_odd - 1.0) * 100.0,
            })
        })
        .collect()
}
