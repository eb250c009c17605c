//! Probability and bankroll helpers shared by the sport models

use statrs::function::erf::erf;
use statrs::function::factorial::ln_factorial;
use std::f64::consts::PI;

/// Standard normal CDF
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / 2f64.sqrt()))
}

/// Standard normal density
pub fn normal_pdf(x: f64) -> f64 {
    (1.0 / (2.0 * PI).sqrt()) * (-0.5 * x * x).exp()
}

/// P(X > line) for X ~ N(mu, sigma). Zero when sigma is not positive.
pub fn prob_over_normal(mu: f64, sigma: f64, line: f64) -> f64 {
    if sigma <= 0.0 {
        return 0.0;
    }
    1.0 - normal_cdf((line - mu) / sigma)
}

/// P(X < line) for X ~ N(mu, sigma). Zero when sigma is not positive.
pub fn prob_under_normal(mu: f64, sigma: f64, line: f64) -> f64 {
    if sigma <= 0.0 {
        return 0.0;
    }
    normal_cdf((line - mu) / sigma)
}

pub fn poisson_pmf(k: u32, lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 0.0;
    }
    (k as f64 * lambda.ln() - lambda - ln_factorial(k as u64)).exp()
}

pub fn poisson_cdf(k: u32, lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 0.0;
    }
    (0..=k).map(|i| poisson_pmf(i, lambda)).sum()
}

/// Profit per unit staked. Returns -1 for probabilities outside (0, 1) or odds <= 1.
pub fn expected_value(prob: f64, odds: f64) -> f64 {
    if prob <= 0.0 || prob >= 1.0 || odds <= 1.0 {
        return -1.0;
    }
    prob * (odds - 1.0) - (1.0 - prob)
}

pub fn implied_probability(odds: f64, remove_vig: bool, total_prob: f64) -> f64 {
    if odds <= 1.0 {
        return 0.0;
    }
    let implied = 1.0 / odds;
    if remove_vig && total_prob > 1.0 {
        implied / total_prob
    } else {
        implied
    }
}

/// Kelly stake as a bankroll fraction, clamped to [0, 1]
pub fn kelly_criterion(prob: f64, odds: f64, fraction: f64) -> f64 {
    if prob <= 0.0 || prob >= 1.0 || odds <= 1.0 {
        return 0.0;
    }
    let kelly = (prob * odds - 1.0) / (odds - 1.0) * fraction;
    kelly.clamp(0.0, 1.0)
}

pub fn sharpe_ratio(ev: f64, std_dev: f64, risk_free_rate: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    (ev - risk_free_rate) / std_dev
}

/// Wald interval for a probability estimated from `n_samples`
pub fn confidence_interval(prob: f64, n_samples: u32, confidence: f64) -> (f64, f64) {
    if n_samples == 0 || prob <= 0.0 || prob >= 1.0 {
        return (prob, prob);
    }

    let z = if (confidence - 0.90).abs() < 1e-9 {
        1.645
    } else if (confidence - 0.99).abs() < 1e-9 {
        2.576
    } else {
        1.96
    };

    let se = (prob * (1.0 - prob) / n_samples as f64).sqrt();
    ((prob - z * se).max(0.0), (prob + z * se).min(1.0))
}

pub fn odds_to_american(decimal_odds: f64) -> i64 {
    if decimal_odds >= 2.0 {
        ((decimal_odds - 1.0) * 100.0) as i64
    } else {
        (-100.0 / (decimal_odds - 1.0)) as i64
    }
}

pub fn american_to_odds(american_odds: i64) -> f64 {
    if american_odds > 0 {
        1.0 + american_odds as f64 / 100.0
    } else {
        1.0 + 100.0 / (american_odds as f64).abs()
    }
}

/// Bookmaker margin: summed implied probability above 1
pub fn calculate_vig(odds: &[f64]) -> f64 {
    let total: f64 = odds.iter().filter(|o| **o > 1.0).map(|o| 1.0 / o).sum();
    (total - 1.0).max(0.0)
}

/// Scale implied probabilities so they sum to 1. Invalid odds pass through.
pub fn remove_vig_proportional(odds: &[f64]) -> Vec<f64> {
    let total: f64 = odds.iter().filter(|o| **o > 1.0).map(|o| 1.0 / o).sum();
    if total <= 1.0 {
        return odds.to_vec();
    }

    odds.iter()
        .map(|&o| if o > 1.0 { 1.0 / ((1.0 / o) / total) } else { o })
        .collect()
}
