//! Expected value against margin-free prices

use crate::decision::basketball_stats::SpreadProbabilities;
use crate::decision::devig::{devig_odds, DevigMethod};
use crate::decision::math::normal_cdf;
use crate::types::OddsRow;
use serde::Serialize;
use tracing::{debug, warn};

/// P(total > line), 0.5 when sigma is unusable
pub fn prob_over(mu: f64, sigma: f64, line: f64) -> f64 {
    if sigma <= 0.0 || sigma.is_nan() {
        debug!("non-positive sigma in prob_over: {}", sigma);
        return 0.5;
    }
    1.0 - normal_cdf((line - mu) / sigma)
}

pub fn prob_under(mu: f64, sigma: f64, line: f64) -> f64 {
    if sigma <= 0.0 || sigma.is_nan() {
        debug!("non-positive sigma in prob_under: {}", sigma);
        return 0.5;
    }
    normal_cdf((line - mu) / sigma)
}

/// Home covers when margin + line > 0
pub fn prob_home_cover(mu_margin: f64, sigma: f64, line: f64) -> f64 {
    if sigma <= 0.0 || sigma.is_nan() {
        return 0.5;
    }
    1.0 - normal_cdf((-line - mu_margin) / sigma)
}

pub fn prob_away_cover(mu_margin: f64, sigma: f64, line: f64) -> f64 {
    if sigma <= 0.0 || sigma.is_nan() {
        return 0.5;
    }
    normal_cdf((-line - mu_margin) / sigma)
}

/// EV per unit staked with p clamped to [0, 1]. Zero for unusable odds.
pub fn expected_value(p: f64, odds: f64) -> f64 {
    if odds <= 0.0 || odds.is_nan() {
        warn!("Invalid odds in expected_value: {}", odds);
        return 0.0;
    }
    let p = p.clamp(0.0, 1.0);
    p * (odds - 1.0) - (1.0 - p)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvCalculation {
    pub ev: f64,
    pub ev_pct: f64,
    pub model_prob: f64,
    pub implied_prob: f64,
    pub original_odd: f64,
    pub devigged_odd: f64,
    pub edge: f64,
    pub roi: f64,
    pub devig_applied: bool,
}

/// Parameters of the model that produced the probability
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "model_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvModel {
    NormalDistribution {
        total_mean: f64,
        total_std: f64,
        line: f64,
        selection: String,
    },
    SpreadAnalysis {
        expected_margin: f64,
        margin_std: f64,
        spread_line: f64,
        selection: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvResult {
    #[serde(flatten)]
    pub calc: EvCalculation,
    pub model: EvModel,
}

/// EV of `odd` priced against the devigged quotes for the same pick.
///
/// Devig uses every bookmaker quoting the same event, market, line and
/// selection. With fewer than two such quotes the raw price is used.
pub fn calculate_ev_with_devig(
    model_prob: f64,
    odd: &OddsRow,
    market: &[OddsRow],
    use_devig: bool,
) -> EvCalculation {
    let original_odd = odd.odds;
    let mut fair_odd = original_odd;
    let mut devig_applied = false;

    if use_devig && market.len() >= 2 {
        let same: Vec<&OddsRow> = market.iter().filter(|o| o.same_pick(odd)).collect();

        if same.len() >= 2 {
            let prices: Vec<f64> = same.iter().map(|o| o.odds).collect();
            let devigged = devig_odds(&prices, DevigMethod::Multiplicative);

            let idx = same
                .iter()
                .position(|o| o.odds == original_odd && o.bookmaker == odd.bookmaker)
                .or_else(|| prices.iter().position(|p| *p == original_odd))
                .unwrap_or(0);

            if let Some(fair) = devigged.get(idx) {
                fair_odd = *fair;
                devig_applied = (fair_odd - original_odd).abs() > 1e-9 * original_odd.abs().max(1.0);
            }
        } else {
            debug!("Not enough quotes in the same market to devig");
        }
    }

    if fair_odd <= 0.0 || fair_odd.is_nan() {
        warn!("Invalid fair odd computed, using original: {}", fair_odd);
        fair_odd = original_odd;
    }

    let implied_prob = (if fair_odd > 0.0 { 1.0 / fair_odd } else { 0.5 }).clamp(0.0, 1.0);
    let model_prob = model_prob.clamp(0.0, 1.0);

    let ev = expected_value(model_prob, fair_odd);
    let ev_pct = ev * 100.0;

    EvCalculation {
        ev,
        ev_pct,
        model_prob,
        implied_prob,
        original_odd,
        devigged_odd: fair_odd,
        edge: model_prob - implied_prob,
        roi: ev_pct,
        devig_applied: use_devig && devig_applied,
    }
}

/// Basketball TOTAL: normal model on the game total
pub fn total_ev(
    total_mean: f64,
    total_std: f64,
    line: f64,
    odd: &OddsRow,
    market: &[OddsRow],
    use_devig: bool,
) -> EvResult {
    let selection = odd.selection.to_uppercase();
    let model_prob = if selection == "OVER" {
        prob_over(total_mean, total_std, line)
    } else {
        prob_under(total_mean, total_std, line)
    };

    EvResult {
        calc: calculate_ev_with_devig(model_prob, odd, market, use_devig),
        model: EvModel::NormalDistribution {
            total_mean,
            total_std,
            line,
            selection,
        },
    }
}

/// Basketball SPREAD: cover probability from the matchup margin
pub fn spread_ev(
    spread: &SpreadProbabilities,
    spread_line: f64,
    odd: &OddsRow,
    market: &[OddsRow],
    use_devig: bool,
) -> EvResult {
    let selection = odd.selection.to_uppercase();
    let model_prob = if selection == "HOME" {
        spread.home_cover
    } else {
        spread.away_cover
    };

    EvResult {
        calc: calculate_ev_with_devig(model_prob, odd, market, use_devig),
        model: EvModel::SpreadAnalysis {
            expected_margin: spread.expected_margin,
            margin_std: spread.margin_std,
            spread_line,
            selection,
        },
    }
}

/// Minimum EV, edge and probability gate
pub fn should_bet(calc: &EvCalculation, min_ev: f64, min_edge: f64, min_prob: f64) -> (bool, String) {
    if calc.ev < min_ev {
        return (
            false,
            format!("EV insuficiente: {:.1}% < {:.1}%", calc.ev * 100.0, min_ev * 100.0),
        );
    }
    if calc.edge < min_edge {
        return (
            false,
            format!("Edge insuficiente: {:.1}% < {:.1}%", calc.edge * 100.0, min_edge * 100.0),
        );
    }
    if calc.model_prob < min_prob {
        return (
            false,
            format!(
                "Probabilidad muy baja: {:.1}% < {:.1}%",
                calc.model_prob * 100.0,
                min_prob * 100.0
            ),
        );
    }
    (
        true,
        format!(
            "✅ EV={:.1}%, Edge={:.1}%, Prob={:.1}%",
            calc.ev * 100.0,
            calc.edge * 100.0,
            calc.model_prob * 100.0
        ),
    )
}
