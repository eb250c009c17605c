//! Odds values, market headers and bookmaker names as they appear on odds pages

use crate::ingest::errors::is_valid_odds;
use crate::types::Sport;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Markets scraped from Flashscore odds tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MarketKind {
    Total,
    Spread,
    Moneyline,
    OneXTwo,
    Btts,
    TotalGames,
    HandicapSets,
}

impl MarketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketKind::Total => "TOTAL",
            MarketKind::Spread => "SPREAD",
            MarketKind::Moneyline => "MONEYLINE",
            MarketKind::OneXTwo => "1X2",
            MarketKind::Btts => "BTTS",
            MarketKind::TotalGames => "TOTAL_GAMES",
            MarketKind::HandicapSets => "HANDICAP_SETS",
        }
    }

    /// Selections in the column order of the odds table
    pub fn selections(&self) -> &'static [&'static str] {
        match self {
            MarketKind::Total | MarketKind::TotalGames => &["OVER", "UNDER"],
            MarketKind::Spread | MarketKind::Moneyline | MarketKind::HandicapSets => {
                &["HOME", "AWAY"]
            }
            MarketKind::OneXTwo => &["HOME", "DRAW", "AWAY"],
            MarketKind::Btts => &["YES", "NO"],
        }
    }

    pub fn has_line(&self) -> bool {
        matches!(
            self,
            MarketKind::Total | MarketKind::Spread | MarketKind::TotalGames | MarketKind::HandicapSets
        )
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TOTAL" => Ok(MarketKind::Total),
            "SPREAD" => Ok(MarketKind::Spread),
            "MONEYLINE" => Ok(MarketKind::Moneyline),
            "1X2" => Ok(MarketKind::OneXTwo),
            "BTTS" => Ok(MarketKind::Btts),
            "TOTAL_GAMES" => Ok(MarketKind::TotalGames),
            "HANDICAP_SETS" => Ok(MarketKind::HandicapSets),
            other => Err(format!("Unknown market: {}", other)),
        }
    }
}

/// Parse a displayed price: `1.90`, `1,90` or fractional `19/10`.
/// Returns None for placeholders and for prices outside [1.01, 1000].
pub fn parse_odds_value(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() || text == "-" || text.eq_ignore_ascii_case("n/a") {
        return None;
    }
    let text = text.replace(',', ".");

    let odds = match text.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den <= 0.0 {
                return None;
            }
            num / den + 1.0
        }
        None => text.parse().ok()?,
    };

    is_valid_odds(odds).then_some(odds)
}

/// First signed number in a market header or line cell, e.g. `Over/Under 2.5` -> 2.5
pub fn extract_line(text: &str) -> Option<f64> {
    let re = Regex::new(r"[-+]?\d+(?:[.,]\d+)?").ok()?;
    let m = re.find(text)?;
    m.as_str().replace(',', ".").parse().ok()
}

fn has_word(text: &str, word: &str) -> bool {
    Regex::new(&format!(r"\b{}\b", regex::escape(word)))
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// Map a market header to a market for the given sport
pub fn identify_market_type(text: &str, sport: Sport) -> Option<MarketKind> {
    let upper = text.to_uppercase();
    let any = |needles: &[&str]| needles.iter().any(|n| upper.contains(n));

    match sport {
        Sport::Basketball => {
            if any(&["TOTAL", "OVER/UNDER", "O/U"]) {
                Some(MarketKind::Total)
            } else if any(&["SPREAD", "HANDICAP"]) || has_word(&upper, "AH") {
                Some(MarketKind::Spread)
            } else if any(&["MONEYLINE", "WINNER", "1X2", "HOME/AWAY"]) {
                Some(MarketKind::Moneyline)
            } else {
                None
            }
        }
        Sport::Football => {
            if any(&["1X2", "FULL TIME RESULT", "MATCH RESULT"]) {
                Some(MarketKind::OneXTwo)
            } else if any(&["BTTS", "BOTH TEAMS TO SCORE"]) || has_word(&upper, "GG") {
                Some(MarketKind::Btts)
            } else if any(&["TOTAL", "OVER/UNDER", "GOALS"]) {
                Some(MarketKind::Total)
            } else {
                None
            }
        }
        Sport::Tennis => {
            if any(&["TOTAL GAMES", "GAMES O/U", "OVER/UNDER"]) {
                Some(MarketKind::TotalGames)
            } else if any(&["HANDICAP", "SETS"]) {
                Some(MarketKind::HandicapSets)
            } else if any(&["WINNER", "MONEYLINE", "MATCH", "HOME/AWAY"]) {
                Some(MarketKind::Moneyline)
            } else {
                None
            }
        }
    }
}

const BOOKMAKER_NAMES: &[(&str, &str)] = &[
    ("bet365", "Bet365"),
    ("betfair", "Betfair"),
    ("william hill", "William Hill"),
    ("williamhill", "William Hill"),
    ("1xbet", "1xBet"),
    ("pinnacle", "Pinnacle"),
    ("betway", "Betway"),
    ("unibet", "Unibet"),
    ("bwin", "Bwin"),
    ("888sport", "888Sport"),
    ("ladbrokes", "Ladbrokes"),
];

/// Canonical bookmaker name; unknown names are title-cased
pub fn normalize_bookmaker_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    if let Some((_, canonical)) = BOOKMAKER_NAMES.iter().find(|(key, _)| lower.contains(key)) {
        return canonical.to_string();
    }

    lower
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_odds_value() {
        assert_eq!(parse_odds_value("1.90"), Some(1.9));
        assert_eq!(parse_odds_value(" 1,85 "), Some(1.85));
        assert!((parse_odds_value("19/10").unwrap() - 2.9).abs() < 1e-9);
        assert_eq!(parse_odds_value("-"), None);
        assert_eq!(parse_odds_value("N/A"), None);
        assert_eq!(parse_odds_value("1.00"), None);
        assert_eq!(parse_odds_value("1500"), None);
        assert_eq!(parse_odds_value("abc"), None);
        assert_eq!(parse_odds_value("3/0"), None);
    }

    #[test]
    fn test_extract_line() {
        assert_eq!(extract_line("Over/Under 2.5"), Some(2.5));
        assert_eq!(extract_line("-5,5"), Some(-5.5));
        assert_eq!(extract_line("+3.5"), Some(3.5));
        assert_eq!(extract_line("Winner"), None);
    }

    #[test]
    fn test_identify_market_type() {
        assert_eq!(
            identify_market_type("Over/Under 220.5", Sport::Basketball),
            Some(MarketKind::Total)
        );
        assert_eq!(
            identify_market_type("Asian Handicap", Sport::Basketball),
            Some(MarketKind::Spread)
        );
        assert_eq!(
            identify_market_type("Utah Jazz", Sport::Basketball),
            None
        );
        assert_eq!(
            identify_market_type("Full Time Result", Sport::Football),
            Some(MarketKind::OneXTwo)
        );
        assert_eq!(
            identify_market_type("Both Teams To Score", Sport::Football),
            Some(MarketKind::Btts)
        );
        assert_eq!(
            identify_market_type("Total Goals 2.5", Sport::Football),
            Some(MarketKind::Total)
        );
        assert_eq!(
            identify_market_type("Match total games 22.5", Sport::Tennis),
            Some(MarketKind::TotalGames)
        );
        assert_eq!(
            identify_market_type("Match Winner", Sport::Tennis),
            Some(MarketKind::Moneyline)
        );
    }

    #[test]
    fn test_market_kind() {
        assert_eq!("1x2".parse::<MarketKind>().unwrap(), MarketKind::OneXTwo);
        assert_eq!(MarketKind::OneXTwo.selections().len(), 3);
        assert!(MarketKind::TotalGames.has_line());
        assert!(!MarketKind::Btts.has_line());
    }

    #[test]
    fn test_normalize_bookmaker_name() {
        assert_eq!(normalize_bookmaker_name("bet365.com"), "Bet365");
        assert_eq!(normalize_bookmaker_name("WILLIAM HILL"), "William Hill");
        assert_eq!(normalize_bookmaker_name("some book"), "Some Book");
    }
}
