//! Team scoring statistics for basketball totals and spreads
//!
//! Averages come from the `game_results` table. When a team has fewer than
//! [`MIN_GAMES_REQUIRED`] recent games, or no database is attached, league
//! defaults are used instead.

use crate::db::Database;
use crate::decision::math::normal_cdf;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

pub const MIN_GAMES_REQUIRED: usize = 5;
const CACHE_TTL_HOURS: i64 = 6;
const STATS_LOOKBACK_DAYS: i64 = 60;
const FORM_LOOKBACK_DAYS: i64 = 30;

/// Weight of a team's own scoring against the opponent's points allowed
const ATTACK_WEIGHT: f64 = 0.6;
const DEFENSE_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataQuality {
    High,
    Medium,
    Low,
    Default,
}

impl DataQuality {
    fn assess(found: usize, requested: usize) -> Self {
        let ratio = found as f64 / requested.max(1) as f64;
        if ratio >= 0.8 {
            DataQuality::High
        } else if ratio >= 0.5 {
            DataQuality::Medium
        } else {
            DataQuality::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStats {
    pub team: String,
    pub league: String,
    pub points_mean: f64,
    pub points_std: f64,
    pub opponent_points_mean: f64,
    pub opponent_points_std: f64,
    pub total_mean: f64,
    pub total_std: f64,
    pub games_analyzed: usize,
    pub last_updated: DateTime<Utc>,
    pub data_quality: DataQuality,
}

impl TeamStats {
    /// League baseline, NBA when the league has no defaults of its own
    pub fn league_default(team: &str, league: &str) -> Self {
        let (points, points_std, total, total_std) = match league {
            "CBA" => (105.0, 12.0, 210.0, 16.0),
            _ => (112.0, 10.0, 224.0, 14.0),
        };
        Self {
            team: team.to_string(),
            league: league.to_string(),
            points_mean: points,
            points_std,
            opponent_points_mean: points,
            opponent_points_std: points_std,
            total_mean: total,
            total_std,
            games_analyzed: 0,
            last_updated: Utc::now(),
            data_quality: DataQuality::Default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpreadProbabilities {
    pub home_cover: f64,
    pub away_cover: f64,
    pub expected_margin: f64,
    pub margin_std: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormTrend {
    WinningStreak,
    LosingStreak,
    Mixed,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentForm {
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub avg_points: f64,
    pub avg_points_allowed: f64,
    pub trend: FormTrend,
    pub games_analyzed: usize,
}

impl RecentForm {
    fn unknown() -> Self {
        Self {
            wins: 0,
            losses: 0,
            win_rate: 0.0,
            avg_points: 0.0,
            avg_points_allowed: 0.0,
            trend: FormTrend::Unknown,
            games_analyzed: 0,
        }
    }
}

pub(crate) fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population standard deviation
fn pstd(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    (xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64).sqrt()
}

pub struct BasketballStatsEngine {
    db: Option<Arc<Database>>,
    cache: Mutex<HashMap<String, TeamStats>>,
}

impl BasketballStatsEngine {
    pub fn new(db: Option<Arc<Database>>) -> Self {
        Self {
            db,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Scoring averages over a team's last `last_n` games in the league
    pub async fn team_stats(&self, team: &str, league: &str, last_n: usize) -> TeamStats {
        let key = format!("{}_{}_{}", team, league, last_n);
        {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.get(&key) {
                if Utc::now() - cached.last_updated < Duration::hours(CACHE_TTL_HOURS) {
                    return cached.clone();
                }
            }
        }

        let Some(db) = &self.db else {
            return TeamStats::league_default(team, league);
        };

        let since = Utc::now() - Duration::days(STATS_LOOKBACK_DAYS);
        let games = match db.team_games(team, league, since, last_n as i64).await {
            Ok(games) => games,
            Err(e) => {
                error!("Error getting stats for {}: {}", team, e);
                return TeamStats::league_default(team, league);
            }
        };

        if games.len() < MIN_GAMES_REQUIRED {
            warn!(
                "Insufficient data for {} ({} games), using defaults",
                team,
                games.len()
            );
            return TeamStats::league_default(team, league);
        }

        let mut scored = Vec::with_capacity(games.len());
        let mut allowed = Vec::with_capacity(games.len());
        let mut totals = Vec::with_capacity(games.len());
        for game in &games {
            let (us, them) = if game.home_team == team {
                (game.home_score, game.away_score)
            } else {
                (game.away_score, game.home_score)
            };
            scored.push(us as f64);
            allowed.push(them as f64);
            totals.push((game.home_score + game.away_score) as f64);
        }

        let stats = TeamStats {
            team: team.to_string(),
            league: league.to_string(),
            points_mean: mean(&scored),
            points_std: pstd(&scored),
            opponent_points_mean: mean(&allowed),
            opponent_points_std: pstd(&allowed),
            total_mean: mean(&totals),
            total_std: pstd(&totals),
            games_analyzed: games.len(),
            last_updated: Utc::now(),
            data_quality: DataQuality::assess(games.len(), last_n),
        };

        self.cache.lock().await.insert(key, stats.clone());
        stats
    }

    async fn expected_points(&self, home: &str, away: &str, league: &str) -> (f64, f64, f64) {
        let h = self.team_stats(home, league, 10).await;
        let a = self.team_stats(away, league, 10).await;

        let home_expected = h.points_mean * ATTACK_WEIGHT + a.opponent_points_mean * DEFENSE_WEIGHT;
        let away_expected = a.points_mean * ATTACK_WEIGHT + h.opponent_points_mean * DEFENSE_WEIGHT;
        let std = (h.points_std.powi(2) + a.points_std.powi(2)).sqrt();

        (home_expected, away_expected, std)
    }

    /// Expected game total and its standard deviation
    pub async fn matchup_total(&self, home: &str, away: &str, league: &str) -> (f64, f64) {
        let (home_expected, away_expected, std) = self.expected_points(home, away, league).await;
        let total = home_expected + away_expected;
        info!("Matchup {} vs {}: Total={:.1}±{:.1}", home, away, total, std);
        (total, std)
    }

    /// Cover probabilities for a spread line applied to the home margin
    pub async fn matchup_spread(
        &self,
        home: &str,
        away: &str,
        league: &str,
        spread_line: f64,
    ) -> SpreadProbabilities {
        let (home_expected, away_expected, std) = self.expected_points(home, away, league).await;
        let margin = home_expected - away_expected;

        let home_cover = if std > 0.0 {
            1.0 - normal_cdf((spread_line - margin) / std)
        } else if margin > spread_line {
            1.0
        } else {
            0.0
        };

        SpreadProbabilities {
            home_cover,
            away_cover: 1.0 - home_cover,
            expected_margin: margin,
            margin_std: std,
        }
    }

    /// Wins and scoring over a team's last few games
    pub async fn recent_form(&self, team: &str, league: &str, last_n: usize) -> RecentForm {
        let Some(db) = &self.db else {
            return RecentForm::unknown();
        };

        let since = Utc::now() - Duration::days(FORM_LOOKBACK_DAYS);
        let games = match db.team_games(team, league, since, last_n as i64).await {
            Ok(games) if !games.is_empty() => games,
            Ok(_) => return RecentForm::unknown(),
            Err(e) => {
                error!("Error getting form for {}: {}", team, e);
                return RecentForm::unknown();
            }
        };

        let mut wins = 0;
        let mut points = Vec::new();
        let mut allowed = Vec::new();
        for game in &games {
            let (us, them) = if game.home_team == team {
                (game.home_score, game.away_score)
            } else {
                (game.away_score, game.home_score)
            };
            if us > them {
                wins += 1;
            }
            points.push(us as f64);
            allowed.push(them as f64);
        }
        let losses = games.len() - wins;

        let trend = if wins >= 4 {
            FormTrend::WinningStreak
        } else if losses >= 4 {
            FormTrend::LosingStreak
        } else {
            FormTrend::Mixed
        };

        RecentForm {
            wins,
            losses,
            win_rate: wins as f64 / games.len() as f64,
            avg_points: mean(&points),
            avg_points_allowed: mean(&allowed),
            trend,
            games_analyzed: games.len(),
        }
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
        info!("Stats cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameResult;

    async fn db_with_games(n: usize) -> Arc<Database> {
        let db = Database::in_memory().await.unwrap();
        for i in 0..n {
            db.record_game_result(&GameResult {
                sport: "basketball".to_string(),
                league: "NBA".to_string(),
                home_team: "Lakers".to_string(),
                away_team: format!("Team{}", i),
                home_score: 110 + (i as i64 % 2) * 10,
                away_score: 100,
                game_date: Utc::now() - Duration::days(i as i64 + 1),
            })
            .await
            .unwrap();
        }
        Arc::new(db)
    }

    #[tokio::test]
    async fn test_defaults_without_db() {
        let engine = BasketballStatsEngine::new(None);
        let stats = engine.team_stats("Lakers", "NBA", 10).await;
        assert_eq!(stats.data_quality, DataQuality::Default);
        assert!((stats.points_mean - 112.0).abs() < 0.001);

        let cba = engine.team_stats("Guangdong", "CBA", 10).await;
        assert!((cba.total_mean - 210.0).abs() < 0.001);

        let unknown = engine.team_stats("X", "Liga ACB", 10).await;
        assert!((unknown.total_mean - 224.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_matchup_total_defaults() {
        let engine = BasketballStatsEngine::new(None);
        let (total, std) = engine.matchup_total("Lakers", "Celtics", "NBA").await;
        assert!((total - 224.0).abs() < 0.001);
        assert!((std - 200f64.sqrt()).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_spread_probabilities() {
        let engine = BasketballStatsEngine::new(None);
        let probs = engine.matchup_spread("Lakers", "Celtics", "NBA", -5.5).await;
        assert!(probs.expected_margin.abs() < 1e-9);
        assert!(probs.home_cover > 0.6 && probs.home_cover < 0.7);
        assert!((probs.home_cover + probs.away_cover - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_team_stats_from_results() {
        let engine = BasketballStatsEngine::new(Some(db_with_games(6).await));
        let stats = engine.team_stats("Lakers", "NBA", 10).await;
        assert_eq!(stats.games_analyzed, 6);
        assert_eq!(stats.data_quality, DataQuality::Medium);
        assert!((stats.points_mean - 115.0).abs() < 0.001);
        assert!((stats.points_std - 5.0).abs() < 0.001);
        assert!((stats.opponent_points_mean - 100.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_insufficient_games_use_defaults() {
        let engine = BasketballStatsEngine::new(Some(db_with_games(3).await));
        let stats = engine.team_stats("Lakers", "NBA", 10).await;
        assert_eq!(stats.data_quality, DataQuality::Default);
    }

    #[tokio::test]
    async fn test_recent_form() {
        let engine = BasketballStatsEngine::new(Some(db_with_games(6).await));
        let form = engine.recent_form("Lakers", "NBA", 5).await;
        assert_eq!(form.wins, 5);
        assert_eq!(form.trend, FormTrend::WinningStreak);

        let none = BasketballStatsEngine::new(None).recent_form("Lakers", "NBA", 5).await;
        assert_eq!(none.trend, FormTrend::Unknown);
    }
}
