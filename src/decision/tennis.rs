//! Elo and normal-approximation models for tennis

use crate::decision::math::{expected_value, prob_over_normal, prob_under_normal};
use crate::sports::{sport_config, MarketParams};
use crate::types::{OddsRow, Sport};
use serde::Serialize;

pub const ELO_SCALE: f64 = 400.0;
pub const BASE_ELO: f64 = 2000.0;
/// Rating gap assumed in favour of the listed home player when no ratings are known
pub const BASELINE_ELO_EDGE: f64 = 200.0;

pub fn elo_win_probability(elo_player1: f64, elo_player2: f64, scale: f64) -> f64 {
    let diff = elo_player2 - elo_player1;
    1.0 / (1.0 + 10f64.powf(diff / scale))
}

fn clamp_prob(p: f64) -> f64 {
    p.clamp(0.01, 0.99)
}

/// Scale a win probability by the players' relative surface form
pub fn surface_adjustment(base_prob: f64, player1_factor: f64, player2_factor: f64) -> f64 {
    if player2_factor == 0.0 {
        return base_prob;
    }
    clamp_prob(base_prob * player1_factor / player2_factor)
}

pub fn prob_over_games(mu: f64, sigma: f64, line: f64) -> f64 {
    prob_over_normal(mu, sigma, line)
}

pub fn prob_under_games(mu: f64, sigma: f64, line: f64) -> f64 {
    prob_under_normal(mu, sigma, line)
}

/// Expected total games and spread from how even the match is.
/// Closer matches play more sets and vary more.
pub fn estimate_total_games(prob_player1: f64, best_of: u8, avg_games_per_set: f64) -> (f64, f64) {
    let competitiveness = 1.0 - (prob_player1 - 0.5).abs() * 2.0;
    let expected_sets = if best_of == 3 {
        2.0 + competitiveness
    } else {
        3.0 + competitiveness * 2.0
    };
    (
        expected_sets * avg_games_per_set,
        2.0 + competitiveness * 3.0,
    )
}

/// P(player 1 covers a +/-1.5 set handicap). Other handicaps fall back to the match probability.
pub fn prob_set_handicap(prob_player1: f64, handicap: f64, best_of: u8) -> f64 {
    let p = prob_player1;
    let is = |h: f64| (handicap - h).abs() < 1e-9;

    match best_of {
        3 if is(-1.5) => p.powi(2) * 0.7,
        3 if is(1.5) => 1.0 - (1.0 - p).powi(2) * 0.7,
        5 if is(-1.5) => p.powi(3) * 0.5 + p.powi(3) * (1.0 - p) * 3.0 * 0.6,
        5 if is(1.5) => 1.0 - p.powi(3) * 0.5,
        _ if handicap < 0.0 => p,
        _ => 1.0 - p,
    }
}

/// Grand Slam draws are best of five
pub fn best_of(league: &str) -> u8 {
    if league.contains("Grand Slam") {
        5
    } else {
        3
    }
}

pub fn adjust_for_fatigue(base_prob: f64, matches_last_7_days: u32, factor: f64) -> f64 {
    if matches_last_7_days <= 1 {
        return base_prob;
    }
    let penalty = (matches_last_7_days - 1) as f64 * factor;
    clamp_prob(base_prob * (1.0 - penalty))
}

pub fn adjust_for_h2h(base_prob: f64, wins: u32, losses: u32, weight: f64) -> f64 {
    let total = wins + losses;
    if total == 0 {
        return base_prob;
    }
    let h2h = wins as f64 / total as f64;
    clamp_prob((1.0 - weight) * base_prob + weight * h2h)
}

/// Rough Elo from a world ranking: #1 = top, then 150 points per log-rank
pub fn elo_from_ranking(ranking: u32, base_elo: f64, top_elo: f64) -> f64 {
    match ranking {
        0 => base_elo,
        1 => top_elo,
        r => (top_elo - (r as f64).ln() * 150.0).max(base_elo),
    }
}

/// (home, away) fair prices, even money when the probability is degenerate
pub fn fair_odds_moneyline(prob_player1: f64) -> (f64, f64) {
    if prob_player1 <= 0.0 || prob_player1 >= 1.0 {
        return (2.0, 2.0);
    }
    (1.0 / prob_player1, 1.0 / (1.0 - prob_player1))
}

/// Model probability of the row's selection.
/// Moneyline uses the baseline Elo edge, totals use the league games model.
pub fn model_probability(row: &OddsRow) -> Option<f64> {
    let market = row.market.to_uppercase();
    let selection = row.selection.to_uppercase();

    match market.as_str() {
        "MONEYLINE" => {
            let p_home = elo_win_probability(BASE_ELO + BASELINE_ELO_EDGE, BASE_ELO, ELO_SCALE);
            match selection.as_str() {
                "HOME" => Some(p_home),
                "AWAY" => Some(1.0 - p_home),
                _ => None,
            }
        }
        "TOTAL_GAMES" => {
            let line = row.line?;
            let (mu, sigma) = match sport_config(Sport::Tennis, &row.league, "games").ok()? {
                MarketParams::Games { mu, sigma, .. } => (mu, sigma),
                _ => return None,
            };
            match selection.as_str() {
                "OVER" => Some(prob_over_games(mu, sigma, line)),
                "UNDER" => Some(prob_under_games(mu, sigma, line)),
                _ => None,
            }
        }
        "HANDICAP_SETS" => {
            let line = row.line?;
            let bo = best_of(&row.league);
            match selection.as_str() {
                "HOME" => Some(prob_set_handicap(0.5, line, bo)),
                "AWAY" => Some(prob_set_handicap(0.5, -line, bo)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Moneyline EV from explicit ratings when known
pub fn ev_moneyline(row: &OddsRow, elo_home: Option<f64>, elo_away: Option<f64>) -> Option<f64> {
    let p_home = match (elo_home, elo_away) {
        (Some(h), Some(a)) => elo_win_probability(h, a, ELO_SCALE),
        _ => 0.5,
    };
    let p = match row.selection.to_uppercase().as_str() {
        "HOME" => p_home,
        "AWAY" => 1.0 - p_home,
        _ => return None,
    };
    Some(expected_value(p, row.odds))
}

pub fn ev_total_games(row: &OddsRow) -> Option<f64> {
    if row.market.to_uppercase() != "TOTAL_GAMES" {
        return None;
    }
    model_probability(row).map(|p| expected_value(p, row.odds))
}

pub fn ev_handicap_sets(row: &OddsRow, prob_home: Option<f64>) -> Option<f64> {
    let line = row.line?;
    let p1 = prob_home.unwrap_or(0.5);
    let bo = best_of(&row.league);
    let p = match row.selection.to_uppercase().as_str() {
        "HOME" => prob_set_handicap(p1, line, bo),
        "AWAY" => prob_set_handicap(1.0 - p1, -line, bo),
        _ => return None,
    };
    Some(expected_value(p, row.odds))
}

/// Pre-match analysis from two ratings
#[derive(Debug, Clone, Serialize)]
pub struct MatchAnalysis {
    pub player1: String,
    pub player2: String,
    pub elo_player1: f64,
    pub elo_player2: f64,
    pub prob_player1_win: f64,
    pub prob_player2_win: f64,
    pub fair_odds_player1: f64,
    pub fair_odds_player2: f64,
    pub expected_games: f64,
    pub games_std_dev: f64,
    pub surface: String,
    pub format: String,
}

pub fn analyze_tennis_match(
    player1: &str,
    player2: &str,
    elo_player1: f64,
    elo_player2: f64,
    surface: &str,
    best_of: u8,
) -> MatchAnalysis {
    let p1 = elo_win_probability(elo_player1, elo_player2, ELO_SCALE);
    let (expected_games, games_std_dev) = estimate_total_games(p1, best_of, 10.0);
    let (fair1, fair2) = fair_odds_moneyline(p1);

    MatchAnalysis {
        player1: player1.to_string(),
        player2: player2.to_string(),
        elo_player1,
        elo_player2,
        prob_player1_win: p1,
        prob_player2_win: 1.0 - p1,
        fair_odds_player1: fair1,
        fair_odds_player2: fair2,
        expected_games,
        games_std_dev,
        surface: surface.to_string(),
        format: format!("Best of {}", best_of),
    }
}
