//! Head-to-head, form and over/under trend statistics from finished games

use crate::db::Database;
use crate::decision::basketball_stats::mean;
use crate::types::GameResult;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

const H2H_CACHE_TTL_HOURS: i64 = 12;
const H2H_LOOKBACK_DAYS: i64 = 730;
const FORM_LOOKBACK_DAYS: i64 = 30;
/// Reference total for over/under trend counting
const LEAGUE_AVG_TOTAL: f64 = 220.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum H2hTrend {
    HomeFavored,
    AwayFavored,
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum H2hQuality {
    High,
    Medium,
    Low,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct H2hStats {
    pub total_games: usize,
    pub home_wins: usize,
    pub away_wins: usize,
    pub home_win_rate: f64,
    pub avg_total: f64,
    pub avg_margin: f64,
    /// W/L from the current home side's perspective, newest first
    pub last_results: Vec<char>,
    pub trend: H2hTrend,
    pub data_quality: H2hQuality,
    pub last_updated: DateTime<Utc>,
}

impl H2hStats {
    fn empty() -> Self {
        Self {
            total_games: 0,
            home_wins: 0,
            away_wins: 0,
            home_win_rate: 0.0,
            avg_total: 0.0,
            avg_margin: 0.0,
            last_results: Vec::new(),
            trend: H2hTrend::Balanced,
            data_quality: H2hQuality::None,
            last_updated: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Heat {
    Hot,
    Cold,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormStats {
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub avg_points_scored: f64,
    pub avg_points_allowed: f64,
    pub avg_margin: f64,
    /// e.g. "W4" or "L2"
    pub streak: String,
    pub trend: Heat,
    pub games_analyzed: usize,
    pub results_sequence: Vec<char>,
}

impl FormStats {
    fn neutral() -> Self {
        Self {
            wins: 0,
            losses: 0,
            win_rate: 0.0,
            avg_points_scored: 0.0,
            avg_points_allowed: 0.0,
            avg_margin: 0.0,
            streak: String::new(),
            trend: Heat::Neutral,
            games_analyzed: 0,
            results_sequence: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TotalsTrend {
    OverTrend,
    UnderTrend,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketTrend {
    pub over_count: usize,
    pub under_count: usize,
    pub over_rate: f64,
    pub avg_total: f64,
    pub trend: TotalsTrend,
    pub confidence: f64,
    pub games_analyzed: usize,
}

impl MarketTrend {
    fn neutral() -> Self {
        Self {
            over_count: 0,
            under_count: 0,
            over_rate: 0.0,
            avg_total: 0.0,
            trend: TotalsTrend::Neutral,
            confidence: 0.5,
            games_analyzed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub market: String,
    /// OVER, UNDER or NONE
    pub selection: String,
    pub confidence: f64,
    pub reasoning: Vec<String>,
    pub over_signals: u32,
    pub under_signals: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComprehensiveAnalysis {
    pub h2h: H2hStats,
    pub home_form: FormStats,
    pub away_form: FormStats,
    pub home_trends: MarketTrend,
    pub away_trends: MarketTrend,
    pub recommendation: Recommendation,
}

/// Points for and against from `team`'s side
fn perspective(game: &GameResult, team: &str) -> (i64, i64) {
    if game.home_team == team {
        (game.home_score, game.away_score)
    } else {
        (game.away_score, game.home_score)
    }
}

pub struct RobustStatsEngine {
    db: Option<Arc<Database>>,
    h2h_cache: Mutex<HashMap<String, H2hStats>>,
}

impl RobustStatsEngine {
    pub fn new(db: Option<Arc<Database>>) -> Self {
        Self {
            db,
            h2h_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Meetings between two teams over the last two years
    pub async fn h2h_stats(&self, home: &str, away: &str, league: &str, last_n: usize) -> H2hStats {
        let key = format!("h2h_{}_{}_{}_{}", home, away, league, last_n);
        {
            let cache = self.h2h_cache.lock().await;
            if let Some(cached) = cache.get(&key) {
                if Utc::now() - cached.last_updated < Duration::hours(H2H_CACHE_TTL_HOURS) {
                    return cached.clone();
                }
            }
        }

        let Some(db) = &self.db else {
            return H2hStats::empty();
        };

        let since = Utc::now() - Duration::days(H2H_LOOKBACK_DAYS);
        let games = match db.h2h_games(home, away, league, since, last_n as i64).await {
            Ok(games) if !games.is_empty() => games,
            Ok(_) => return H2hStats::empty(),
            Err(e) => {
                error!("Error getting H2H stats: {}", e);
                return H2hStats::empty();
            }
        };

        let stats = summarize_h2h(&games, home, last_n);
        self.h2h_cache.lock().await.insert(key, stats.clone());
        stats
    }

    /// Results over the last 30 days
    pub async fn team_form(&self, team: &str, league: &str, last_n: usize) -> FormStats {
        match self.recent_games(team, league, last_n).await {
            Some(games) => summarize_form(&games, team),
            None => FormStats::neutral(),
        }
    }

    /// Over/under record against the reference total. Only TOTAL has a trend.
    pub async fn market_trends(&self, team: &str, league: &str, market: &str, last_n: usize) -> MarketTrend {
        if market != "TOTAL" {
            return MarketTrend::neutral();
        }
        match self.recent_games(team, league, last_n).await {
            Some(games) => summarize_totals(&games),
            None => MarketTrend::neutral(),
        }
    }

    async fn recent_games(&self, team: &str, league: &str, last_n: usize) -> Option<Vec<GameResult>> {
        let db = self.db.as_ref()?;
        let since = Utc::now() - Duration::days(FORM_LOOKBACK_DAYS);
        match db.team_games(team, league, since, last_n as i64).await {
            Ok(games) if !games.is_empty() => Some(games),
            Ok(_) => None,
            Err(e) => {
                error!("Error getting recent games for {}: {}", team, e);
                None
            }
        }
    }

    pub async fn comprehensive_analysis(&self, home: &str, away: &str, league: &str) -> ComprehensiveAnalysis {
        let h2h = self.h2h_stats(home, away, league, 5).await;
        let home_form = self.team_form(home, league, 5).await;
        let away_form = self.team_form(away, league, 5).await;
        let home_trends = self.market_trends(home, league, "TOTAL", 10).await;
        let away_trends = self.market_trends(away, league, "TOTAL", 10).await;

        let recommendation = recommend(&h2h, &home_form, &away_form, &home_trends, &away_trends);

        ComprehensiveAnalysis {
            h2h,
            home_form,
            away_form,
            home_trends,
            away_trends,
            recommendation,
        }
    }
}

fn summarize_h2h(games: &[GameResult], home: &str, last_n: usize) -> H2hStats {
    let mut home_wins = 0;
    let mut totals = Vec::with_capacity(games.len());
    let mut margins = Vec::with_capacity(games.len());
    let mut last_results = Vec::with_capacity(games.len());

    for game in games {
        let (us, them) = perspective(game, home);
        totals.push((game.home_score + game.away_score) as f64);
        margins.push((us - them) as f64);
        if us > them {
            home_wins += 1;
            last_results.push('W');
        } else {
            last_results.push('L');
        }
    }

    let total_games = games.len();
    let home_win_rate = home_wins as f64 / total_games as f64;

    let trend = if home_win_rate >= 0.65 {
        H2hTrend::HomeFavored
    } else if home_win_rate <= 0.35 {
        H2hTrend::AwayFavored
    } else {
        H2hTrend::Balanced
    };

    let requested = last_n as f64;
    let data_quality = if total_games as f64 >= requested * 0.8 {
        H2hQuality::High
    } else if total_games as f64 >= requested * 0.5 {
        H2hQuality::Medium
    } else {
        H2hQuality::Low
    };

    H2hStats {
        total_games,
        home_wins,
        away_wins: total_games - home_wins,
        home_win_rate,
        avg_total: mean(&totals),
        avg_margin: mean(&margins),
        last_results,
        trend,
        data_quality,
        last_updated: Utc::now(),
    }
}

fn summarize_form(games: &[GameResult], team: &str) -> FormStats {
    let mut wins = 0;
    let mut scored = Vec::with_capacity(games.len());
    let mut allowed = Vec::with_capacity(games.len());
    let mut margins = Vec::with_capacity(games.len());
    let mut sequence = Vec::with_capacity(games.len());

    for game in games {
        let (us, them) = perspective(game, team);
        scored.push(us as f64);
        allowed.push(them as f64);
        margins.push((us - them) as f64);
        if us > them {
            wins += 1;
            sequence.push('W');
        } else {
            sequence.push('L');
        }
    }

    let streak = match sequence.first() {
        Some(&first) => {
            let count = sequence.iter().take_while(|r| **r == first).count();
            format!("{}{}", first, count)
        }
        None => String::new(),
    };

    let win_rate = wins as f64 / games.len() as f64;
    let trend = if win_rate >= 0.75 {
        Heat::Hot
    } else if win_rate <= 0.25 {
        Heat::Cold
    } else {
        Heat::Neutral
    };

    FormStats {
        wins,
        losses: games.len() - wins,
        win_rate,
        avg_points_scored: mean(&scored),
        avg_points_allowed: mean(&allowed),
        avg_margin: mean(&margins),
        streak,
        trend,
        games_analyzed: games.len(),
        results_sequence: sequence,
    }
}

fn summarize_totals(games: &[GameResult]) -> MarketTrend {
    let totals: Vec<f64> = games
        .iter()
        .map(|g| (g.home_score + g.away_score) as f64)
        .collect();

    let over_count = totals.iter().filter(|t| **t > LEAGUE_AVG_TOTAL).count();
    let over_rate = over_count as f64 / totals.len() as f64;

    let (trend, confidence) = if over_rate >= 0.70 {
        (TotalsTrend::OverTrend, over_rate)
    } else if over_rate <= 0.30 {
        (TotalsTrend::UnderTrend, 1.0 - over_rate)
    } else {
        (TotalsTrend::Neutral, 0.5)
    };

    MarketTrend {
        over_count,
        under_count: totals.len() - over_count,
        over_rate,
        avg_total: mean(&totals),
        trend,
        confidence,
        games_analyzed: totals.len(),
    }
}

/// Count over/under signals and weight them into a totals lean
pub fn recommend(
    h2h: &H2hStats,
    home_form: &FormStats,
    away_form: &FormStats,
    home_trends: &MarketTrend,
    away_trends: &MarketTrend,
) -> Recommendation {
    let mut reasoning = Vec::new();
    let mut weight = 0.0;
    let mut over_signals = 0;
    let mut under_signals = 0;

    if h2h.avg_total > 220.0 {
        over_signals += 1;
        reasoning.push(format!("H2H promedio alto: {:.1}", h2h.avg_total));
        weight += 0.15;
    } else if h2h.avg_total < 210.0 {
        under_signals += 1;
        reasoning.push(format!("H2H promedio bajo: {:.1}", h2h.avg_total));
        weight += 0.15;
    }

    let combined = home_form.avg_points_scored + away_form.avg_points_scored;
    if combined > 225.0 {
        over_signals += 1;
        reasoning.push(format!("Equipos anotando bien: {:.1} PPG combinado", combined));
        weight += 0.20;
    } else if combined < 215.0 {
        under_signals += 1;
        reasoning.push(format!("Equipos anotando poco: {:.1} PPG combinado", combined));
        weight += 0.20;
    }

    if home_trends.trend == TotalsTrend::OverTrend {
        over_signals += 1;
        reasoning.push(format!(
            "Local con tendencia OVER ({:.0}%)",
            home_trends.over_rate * 100.0
        ));
        weight += 0.15;
    }
    if away_trends.trend == TotalsTrend::OverTrend {
        over_signals += 1;
        reasoning.push(format!(
            "Visitante con tendencia OVER ({:.0}%)",
            away_trends.over_rate * 100.0
        ));
        weight += 0.15;
    }

    let (selection, confidence) = if over_signals > under_signals {
        ("OVER", f64::min(weight, 0.85))
    } else if under_signals > over_signals {
        ("UNDER", f64::min(weight, 0.85))
    } else {
        reasoning.push("Señales mixtas - no hay recomendación clara".to_string());
        ("NONE", 0.0)
    };

    Recommendation {
        market: "TOTAL".to_string(),
        selection: selection.to_string(),
        confidence,
        reasoning,
        over_signals,
        under_signals,
    }
}

/// Plain-text report for the CLI
pub fn format_analysis_summary(analysis: &ComprehensiveAnalysis) -> String {
    let mut lines = vec!["📊 ANÁLISIS ESTADÍSTICO COMPLETO".to_string(), String::new()];

    let h2h = &analysis.h2h;
    if h2h.total_games > 0 {
        lines.push(format!("🔄 H2H (últimos {} juegos):", h2h.total_games));
        lines.push(format!("   • Record: {}-{}", h2h.home_wins, h2h.away_wins));
        lines.push(format!("   • Total promedio: {:.1}", h2h.avg_total));
        lines.push(format!("   • Tendencia: {:?}", h2h.trend));
    } else {
        lines.push("🔄 H2H: Sin datos".to_string());
    }
    lines.push(String::new());

    for (label, form) in [
        ("🏠 Forma Local:", &analysis.home_form),
        ("✈️ Forma Visitante:", &analysis.away_form),
    ] {
        if form.trend != Heat::Neutral {
            lines.push(label.to_string());
            lines.push(format!("   • Record: {}-{} ({})", form.wins, form.losses, form.streak));
            lines.push(format!("   • Promedio: {:.1} PPG", form.avg_points_scored));
            lines.push(format!("   • Tendencia: {:?}", form.trend));
        }
    }
    lines.push(String::new());

    let rec = &analysis.recommendation;
    if rec.selection != "NONE" {
        lines.push("💡 RECOMENDACIÓN:".to_string());
        lines.push(format!("   • Mercado: {} {}", rec.market, rec.selection));
        lines.push(format!("   • Confianza: {:.0}%", rec.confidence * 100.0));
        lines.push("   • Razonamiento:".to_string());
        for reason in &rec.reasoning {
            lines.push(format!("     - {}", reason));
        }
    }

    lines.join("\n")
}
