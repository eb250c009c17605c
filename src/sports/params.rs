//! Statistical parameters per sport, league and market

use crate::types::Sport;
use thiserror::Error;

pub const DEFAULT_EV_THRESHOLD: f64 = 0.03;

#[derive(Debug, Error, PartialEq)]
pub enum SportConfigError {
    #[error("League not configured: {league} for {sport}")]
    UnknownLeague { sport: Sport, league: String },
    #[error("Market not configured: {market} for {league}")]
    UnknownMarket { market: String, league: String },
}

/// Model inputs for one market
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarketParams {
    /// Basketball game total, normal model
    Total { mu: f64, sigma: f64, ev_min: f64 },
    Spread { sigma: f64, ev_min: f64 },
    Moneyline { ev_min: f64 },
    /// Football goals, Poisson model
    Goals {
        lambda_home: f64,
        lambda_away: f64,
        ev_min: f64,
    },
    OneXTwo { ev_min: f64 },
    Btts {
        prob_baseline: Option<f64>,
        ev_min: f64,
    },
    /// Tennis total games, normal model
    Games { mu: f64, sigma: f64, ev_min: f64 },
    Sets { ev_min: f64 },
}

impl MarketParams {
    pub fn ev_min(&self) -> f64 {
        match *self {
            MarketParams::Total { ev_min, .. }
            | MarketParams::Spread { ev_min, .. }
            | MarketParams::Moneyline { ev_min }
            | MarketParams::Goals { ev_min, .. }
            | MarketParams::OneXTwo { ev_min }
            | MarketParams::Btts { ev_min, .. }
            | MarketParams::Games { ev_min, .. }
            | MarketParams::Sets { ev_min } => ev_min,
        }
    }
}

#[derive(Debug)]
pub struct LeagueParams {
    pub sport: Sport,
    pub league: &'static str,
    /// Keyed by normalized market name
    pub markets: &'static [(&'static str, MarketParams)],
}

const fn basketball(
    league: &'static str,
    markets: &'static [(&'static str, MarketParams)],
) -> LeagueParams {
    LeagueParams {
        sport: Sport::Basketball,
        league,
        markets,
    }
}

const fn football(
    league: &'static str,
    markets: &'static [(&'static str, MarketParams)],
) -> LeagueParams {
    LeagueParams {
        sport: Sport::Football,
        league,
        markets,
    }
}

const fn tennis(
    league: &'static str,
    markets: &'static [(&'static str, MarketParams)],
) -> LeagueParams {
    LeagueParams {
        sport: Sport::Tennis,
        league,
        markets,
    }
}

static LEAGUE_PARAMS: &[LeagueParams] = &[
    basketball(
        "NBA",
        &[
            ("total", MarketParams::Total { mu: 228.0, sigma: 12.0, ev_min: 0.02 }),
            ("spread", MarketParams::Spread { sigma: 8.0, ev_min: 0.02 }),
            ("moneyline", MarketParams::Moneyline { ev_min: 0.03 }),
        ],
    ),
    basketball(
        "CBA",
        &[
            ("total", MarketParams::Total { mu: 210.0, sigma: 14.0, ev_min: 0.04 }),
            ("spread", MarketParams::Spread { sigma: 10.0, ev_min: 0.04 }),
            ("moneyline", MarketParams::Moneyline { ev_min: 0.05 }),
        ],
    ),
    basketball(
        "Euroleague",
        &[
            ("total", MarketParams::Total { mu: 165.0, sigma: 10.0, ev_min: 0.03 }),
            ("spread", MarketParams::Spread { sigma: 7.0, ev_min: 0.03 }),
            ("moneyline", MarketParams::Moneyline { ev_min: 0.04 }),
        ],
    ),
    football(
        "Premier League",
        &[
            ("goals", MarketParams::Goals { lambda_home: 1.5, lambda_away: 1.2, ev_min: 0.03 }),
            ("1x2", MarketParams::OneXTwo { ev_min: 0.04 }),
            ("btts", MarketParams::Btts { prob_baseline: Some(0.52), ev_min: 0.03 }),
        ],
    ),
    football(
        "La Liga",
        &[
            ("goals", MarketParams::Goals { lambda_home: 1.4, lambda_away: 1.1, ev_min: 0.03 }),
            ("1x2", MarketParams::OneXTwo { ev_min: 0.04 }),
            ("btts", MarketParams::Btts { prob_baseline: Some(0.48), ev_min: 0.03 }),
        ],
    ),
    football(
        "Serie A",
        &[
            ("goals", MarketParams::Goals { lambda_home: 1.3, lambda_away: 1.0, ev_min: 0.03 }),
            ("1x2", MarketParams::OneXTwo { ev_min: 0.04 }),
            ("btts", MarketParams::Btts { prob_baseline: Some(0.45), ev_min: 0.03 }),
        ],
    ),
    football(
        "Bundesliga",
        &[
            ("goals", MarketParams::Goals { lambda_home: 1.6, lambda_away: 1.4, ev_min: 0.03 }),
            ("1x2", MarketParams::OneXTwo { ev_min: 0.04 }),
            ("btts", MarketParams::Btts { prob_baseline: Some(0.55), ev_min: 0.03 }),
        ],
    ),
    football(
        "Ligue 1",
        &[
            ("goals", MarketParams::Goals { lambda_home: 1.4, lambda_away: 1.2, ev_min: 0.03 }),
            ("1x2", MarketParams::OneXTwo { ev_min: 0.04 }),
            ("btts", MarketParams::Btts { prob_baseline: Some(0.50), ev_min: 0.03 }),
        ],
    ),
    football(
        "Champions League",
        &[
            ("goals", MarketParams::Goals { lambda_home: 1.6, lambda_away: 1.4, ev_min: 0.04 }),
            ("1x2", MarketParams::OneXTwo { ev_min: 0.05 }),
            ("btts", MarketParams::Btts { prob_baseline: Some(0.53), ev_min: 0.04 }),
        ],
    ),
    football(
        "Copa Libertadores",
        &[
            ("goals", MarketParams::Goals { lambda_home: 1.5, lambda_away: 1.1, ev_min: 0.04 }),
            ("1x2", MarketParams::OneXTwo { ev_min: 0.05 }),
            ("btts", MarketParams::Btts { prob_baseline: Some(0.48), ev_min: 0.04 }),
        ],
    ),
    football(
        "Liga Colombiana",
        &[
            ("goals", MarketParams::Goals { lambda_home: 1.3, lambda_away: 0.9, ev_min: 0.05 }),
            ("1x2", MarketParams::OneXTwo { ev_min: 0.06 }),
            ("btts", MarketParams::Btts { prob_baseline: Some(0.42), ev_min: 0.05 }),
        ],
    ),
    tennis(
        "ATP",
        &[
            ("games", MarketParams::Games { mu: 22.5, sigma: 4.0, ev_min: 0.04 }),
            ("moneyline", MarketParams::Moneyline { ev_min: 0.03 }),
            ("sets", MarketParams::Sets { ev_min: 0.04 }),
        ],
    ),
    tennis(
        "WTA",
        &[
            ("games", MarketParams::Games { mu: 20.0, sigma: 3.5, ev_min: 0.04 }),
            ("moneyline", MarketParams::Moneyline { ev_min: 0.03 }),
            ("sets", MarketParams::Sets { ev_min: 0.04 }),
        ],
    ),
    tennis(
        "Grand Slam",
        &[
            ("games", MarketParams::Games { mu: 35.0, sigma: 8.0, ev_min: 0.05 }),
            ("moneyline", MarketParams::Moneyline { ev_min: 0.04 }),
            ("sets", MarketParams::Sets { ev_min: 0.05 }),
        ],
    ),
    tennis(
        "ATP Masters 1000",
        &[
            ("games", MarketParams::Games { mu: 23.0, sigma: 4.2, ev_min: 0.04 }),
            ("moneyline", MarketParams::Moneyline { ev_min: 0.03 }),
            ("sets", MarketParams::Sets { ev_min: 0.04 }),
        ],
    ),
    tennis(
        "WTA 1000",
        &[
            ("games", MarketParams::Games { mu: 20.5, sigma: 3.8, ev_min: 0.04 }),
            ("moneyline", MarketParams::Moneyline { ev_min: 0.03 }),
            ("sets", MarketParams::Sets { ev_min: 0.04 }),
        ],
    ),
];

/// Lowercase and strip `_`/`-`, then map odds-feed market names onto config keys
fn normalize_market(sport: Sport, market: &str) -> String {
    let key: String = market
        .to_lowercase()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect();

    match (sport, key.as_str()) {
        (Sport::Football, "total") => "goals".to_string(),
        (Sport::Tennis, "totalgames") => "games".to_string(),
        (Sport::Tennis, "handicapsets") => "sets".to_string(),
        _ => key,
    }
}

pub fn league_params(sport: Sport, league: &str) -> Result<&'static LeagueParams, SportConfigError> {
    LEAGUE_PARAMS
        .iter()
        .find(|p| p.sport == sport && p.league == league)
        .ok_or_else(|| SportConfigError::UnknownLeague {
            sport,
            league: league.to_string(),
        })
}

/// Parameters for one market of a league
pub fn sport_config(sport: Sport, league: &str, market: &str) -> Result<MarketParams, SportConfigError> {
    let params = league_params(sport, league)?;
    let key = normalize_market(sport, market);

    params
        .markets
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, p)| *p)
        .ok_or_else(|| SportConfigError::UnknownMarket {
            market: market.to_string(),
            league: league.to_string(),
        })
}

/// Minimum EV for an alert, 3% when the market is not configured
pub fn ev_threshold(sport: Sport, league: &str, market: &str) -> f64 {
    sport_config(sport, league, market)
        .map(|p| p.ev_min())
        .unwrap_or(DEFAULT_EV_THRESHOLD)
}

/// Z-score threshold for anomaly alerts
pub fn anomaly_threshold(sport: Sport) -> f64 {
    match sport {
        Sport::Basketball => 1.2,
        Sport::Football => 1.5,
        Sport::Tennis => 1.8,
    }
}

const MAJOR_LEAGUES: &[&str] = &[
    "NBA",
    "Premier League",
    "La Liga",
    "Serie A",
    "Bundesliga",
    "Champions League",
    "ATP",
    "WTA",
];

/// Bookmakers needed before a market is analysed
pub fn min_bookmakers(league: &str) -> usize {
    if MAJOR_LEAGUES.contains(&league) {
        3
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sport_config_lookup() {
        let total = sport_config(Sport::Basketball, "NBA", "TOTAL").unwrap();
        assert_eq!(total, MarketParams::Total { mu: 228.0, sigma: 12.0, ev_min: 0.02 });

        let games = sport_config(Sport::Tennis, "WTA", "TOTAL_GAMES").unwrap();
        assert!(matches!(games, MarketParams::Games { mu, .. } if (mu - 20.0).abs() < 1e-9));

        let goals = sport_config(Sport::Football, "Serie A", "TOTAL").unwrap();
        assert!(matches!(goals, MarketParams::Goals { lambda_away, .. } if (lambda_away - 1.0).abs() < 1e-9));
    }

    #[test]
    fn test_unknown_keys() {
        assert!(matches!(
            sport_config(Sport::Basketball, "ACB", "total"),
            Err(SportConfigError::UnknownLeague { .. })
        ));
        assert!(matches!(
            sport_config(Sport::Basketball, "NBA", "btts"),
            Err(SportConfigError::UnknownMarket { .. })
        ));
    }

    #[test]
    fn test_thresholds() {
        assert!((ev_threshold(Sport::Football, "Liga Colombiana", "1X2") - 0.06).abs() < 1e-9);
        assert!((ev_threshold(Sport::Football, "MLS", "1X2") - 0.03).abs() < 1e-9);
        assert!((ev_threshold(Sport::Tennis, "Grand Slam", "HANDICAP_SETS") - 0.05).abs() < 1e-9);
        assert!((anomaly_threshold(Sport::Tennis) - 1.8).abs() < 1e-9);
        assert_eq!(min_bookmakers("NBA"), 3);
        assert_eq!(min_bookmakers("CBA"), 2);
    }
}
