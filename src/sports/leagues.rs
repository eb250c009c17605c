//! League catalog used for discovery and market support checks

use crate::sports::params::SportConfigError;
use crate::types::Sport;

#[derive(Debug, Clone, PartialEq)]
pub struct LeagueInfo {
    pub name: &'static str,
    pub full_name: &'static str,
    pub country: &'static str,
    /// 1 = high, 2 = medium, 3 = low
    pub priority: u8,
    pub flashscore_id: &'static str,
    pub markets: &'static [&'static str],
}

const BASKETBALL_MARKETS: &[&str] = &["TOTAL", "SPREAD", "MONEYLINE"];
const FOOTBALL_MARKETS: &[&str] = &["1X2", "TOTAL", "BTTS", "HANDICAP"];
const FOOTBALL_MARKETS_MINOR: &[&str] = &["1X2", "TOTAL", "BTTS"];
const TENNIS_MARKETS: &[&str] = &["MONEYLINE", "TOTAL_GAMES", "HANDICAP_SETS"];

const fn league(
    name: &'static str,
    full_name: &'static str,
    country: &'static str,
    priority: u8,
    flashscore_id: &'static str,
    markets: &'static [&'static str],
) -> LeagueInfo {
    LeagueInfo {
        name,
        full_name,
        country,
        priority,
        flashscore_id,
        markets,
    }
}

static BASKETBALL: &[LeagueInfo] = &[
    league("NBA", "National Basketball Association", "USA", 1, "nba", BASKETBALL_MARKETS),
    league("CBA", "Chinese Basketball Association", "China", 2, "cba", BASKETBALL_MARKETS),
    league("Euroleague", "Turkish Airlines EuroLeague", "Europe", 1, "euroleague", BASKETBALL_MARKETS),
];

static FOOTBALL: &[LeagueInfo] = &[
    league("Premier League", "Premier League", "England", 1, "premier-league", FOOTBALL_MARKETS),
    league("La Liga", "LaLiga Santander", "Spain", 1, "laliga", FOOTBALL_MARKETS),
    league("Serie A", "Serie A TIM", "Italy", 1, "serie-a", FOOTBALL_MARKETS),
    league("Bundesliga", "Bundesliga", "Germany", 1, "bundesliga", FOOTBALL_MARKETS),
    league("Ligue 1", "Ligue 1 Uber Eats", "France", 1, "ligue-1", FOOTBALL_MARKETS),
    league("Champions League", "UEFA Champions League", "Europe", 1, "champions-league", FOOTBALL_MARKETS),
    league("Copa Libertadores", "Copa Libertadores", "South America", 2, "copa-libertadores", FOOTBALL_MARKETS_MINOR),
    league("Liga Colombiana", "Liga BetPlay Dimayor", "Colombia", 2, "liga-betplay", FOOTBALL_MARKETS_MINOR),
];

static TENNIS: &[LeagueInfo] = &[
    league("ATP", "ATP Tour", "International", 1, "atp", TENNIS_MARKETS),
    league("WTA", "WTA Tour", "International", 1, "wta", TENNIS_MARKETS),
    league(
        "Grand Slam",
        "Grand Slam Tournaments",
        "International",
        1,
        "grand-slam",
        &["MONEYLINE", "TOTAL_GAMES", "HANDICAP_SETS", "SET_EXACT"],
    ),
    league("ATP Masters 1000", "ATP Masters 1000", "International", 1, "atp-masters-1000", TENNIS_MARKETS),
    league("WTA 1000", "WTA 1000", "International", 1, "wta-1000", TENNIS_MARKETS),
];

fn catalog(sport: Sport) -> &'static [LeagueInfo] {
    match sport {
        Sport::Basketball => BASKETBALL,
        Sport::Football => FOOTBALL,
        Sport::Tennis => TENNIS,
    }
}

pub fn league_info(sport: Sport, league: &str) -> Result<&'static LeagueInfo, SportConfigError> {
    catalog(sport)
        .iter()
        .find(|l| l.name == league)
        .ok_or_else(|| SportConfigError::UnknownLeague {
            sport,
            league: league.to_string(),
        })
}

pub fn leagues_by_sport(sport: Sport) -> Vec<&'static str> {
    catalog(sport).iter().map(|l| l.name).collect()
}

pub fn leagues_by_priority(sport: Sport, priority: u8) -> Vec<&'static str> {
    catalog(sport)
        .iter()
        .filter(|l| l.priority == priority)
        .map(|l| l.name)
        .collect()
}

pub fn supported_markets(sport: Sport, league: &str) -> &'static [&'static str] {
    league_info(sport, league).map(|l| l.markets).unwrap_or(&[])
}

pub fn is_market_supported(sport: Sport, league: &str, market: &str) -> bool {
    supported_markets(sport, league)
        .iter()
        .any(|m| m.eq_ignore_ascii_case(market))
}

/// Flashscore path segment for a league, empty when unknown
pub fn flashscore_id(sport: Sport, league: &str) -> &'static str {
    league_info(sport, league)
        .map(|l| l.flashscore_id)
        .unwrap_or("")
}
