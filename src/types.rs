//! Core domain types shared by ingestion, analysis and the API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

/// Sports covered by the alert pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Basketball,
    Football,
    Tennis,
}

impl Sport {
    pub const ALL: [Sport; 3] = [Sport::Basketball, Sport::Football, Sport::Tennis];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Basketball => "basketball",
            Sport::Football => "football",
            Sport::Tennis => "tennis",
        }
    }

    /// Label used in Telegram headers
    pub fn label_es(&self) -> &'static str {
        match self {
            Sport::Basketball => "BALONCESTO",
            Sport::Football => "FÚTBOL",
            Sport::Tennis => "TENIS",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Sport::Basketball => "🏀",
            Sport::Football => "⚽",
            Sport::Tennis => "🎾",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Sport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basketball" | "baloncesto" => Ok(Sport::Basketball),
            "football" | "futbol" | "fútbol" | "soccer" => Ok(Sport::Football),
            "tennis" | "tenis" => Ok(Sport::Tennis),
            other => Err(format!("Unknown sport: {}", other)),
        }
    }
}

/// Why an alert was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertReason {
    Ev,
    Anomaly,
}

impl AlertReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertReason::Ev => "EV",
            AlertReason::Anomaly => "ANOMALY",
        }
    }
}

impl fmt::Display for AlertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AlertReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EV" | "EV+" => Ok(AlertReason::Ev),
            "ANOMALY" | "ANOMALIA" | "ANOMALÍA" => Ok(AlertReason::Anomaly),
            other => Err(format!("Unknown alert reason: {}", other)),
        }
    }
}

/// An event found on a listing page
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredEvent {
    pub sport: Sport,
    pub league: String,
    pub start_time_utc: Option<DateTime<Utc>>,
    pub home: String,
    pub away: String,
    pub url: String,
}

/// A single bookmaker price scraped from a market page
#[derive(Debug, Clone, PartialEq)]
pub struct OddsQuote {
    pub market: String,
    pub line: Option<f64>,
    pub bookmaker: String,
    pub selection: String,
    pub odds: f64,
}

/// Odds row joined with its event, as read back from the snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddsRow {
    pub event_id: i64,
    pub sport: String,
    pub league: String,
    pub start_time_utc: Option<DateTime<Utc>>,
    pub home: String,
    pub away: String,
    pub market: String,
    pub line: Option<f64>,
    pub bookmaker: String,
    pub selection: String,
    pub odds: f64,
    pub captured_at_utc: DateTime<Utc>,
}

impl OddsRow {
    pub fn event_label(&self) -> String {
        format!("{} vs {}", self.home, self.away).trim().to_string()
    }

    /// Same event, market, line and selection
    pub fn same_pick(&self, other: &OddsRow) -> bool {
        self.event_id == other.event_id
            && self.market == other.market
            && self.selection == other.selection
            && lines_equal(self.line, other.line)
    }

    /// Hash key matching [`OddsRow::same_pick`]
    pub fn pick_key(&self) -> (i64, &str, Option<i64>, &str) {
        (self.event_id, &self.market, line_key(self.line), &self.selection)
    }

    /// Same event, market and line (any selection)
    pub fn same_line(&self, other: &OddsRow) -> bool {
        self.event_id == other.event_id
            && self.market == other.market
            && lines_equal(self.line, other.line)
    }
}

/// Hashable form of a line, in thousandths of a point
pub fn line_key(line: Option<f64>) -> Option<i64> {
    line.map(|l| (l * 1000.0).round() as i64)
}

/// Rows bucketed by `key`, groups and members in first-seen order
pub fn group_rows<'a, K, F>(rows: &'a [OddsRow], mut key: F) -> Vec<Vec<&'a OddsRow>>
where
    K: Hash + Eq,
    F: FnMut(&'a OddsRow) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Vec<&'a OddsRow>> = Vec::new();
    for row in rows {
        let slot = *index.entry(key(row)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(row);
    }
    groups
}

/// Lines compare equal when both are absent or within float noise
pub fn lines_equal(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => (x - y).abs() < 1e-9,
        _ => false,
    }
}

/// A persisted alert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord {
    pub id: i64,
    pub sport: String,
    pub league: String,
    pub event: String,
    pub start_time_utc: Option<DateTime<Utc>>,
    pub market: String,
    pub line: Option<f64>,
    pub selection: String,
    pub bookmaker: String,
    pub odds: f64,
    pub reason: String,
    pub score: f64,
    pub message: Option<String>,
    pub created_at_utc: DateTime<Utc>,
    pub sent_at_utc: Option<DateTime<Utc>>,
}

impl AlertRecord {
    pub fn is_ev(&self) -> bool {
        self.reason == AlertReason::Ev.as_str()
    }

    pub fn is_sent(&self) -> bool {
        self.sent_at_utc.is_some()
    }
}

/// One historical price for a pick at a bookmaker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OddsPoint {
    pub odds: f64,
    pub captured_at_utc: DateTime<Utc>,
}

/// A finished game used for team statistics
#[derive(Debug, Clone, PartialEq)]
pub struct GameResult {
    pub sport: String,
    pub league: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: i64,
    pub away_score: i64,
    pub game_date: DateTime<Utc>,
}
