//! SQLite storage for events, odds snapshots, alerts and game results

use crate::types::{
    AlertReason, AlertRecord, DiscoveredEvent, GameResult, OddsPoint, OddsQuote, OddsRow,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

/// Sentinel used so that alerts without a line still collide in the dedupe index
const NULL_LINE_KEY: &str = "-1000000000.0";

/// Format a timestamp the way every column stores it
pub fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Filters accepted by [`Database::query_alerts`]
#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
    pub sport: Option<String>,
    pub reason: Option<AlertReason>,
    pub market: Option<String>,
    pub league: Option<String>,
    pub sent: Option<bool>,
    pub limit: i64,
}

/// Aggregate alert counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertStats {
    pub total: i64,
    pub ev: i64,
    pub anomalies: i64,
    pub sent: i64,
    pub last_created: Option<DateTime<Utc>>,
}

/// Database connection pool
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(path)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.initialize().await?;

        Ok(db)
    }

    /// Private in-memory database, one connection so every query sees the same data
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory database")?;

        let db = Self { pool };
        db.initialize().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sport TEXT NOT NULL,
                league TEXT NOT NULL,
                start_time_utc TEXT,
                home TEXT NOT NULL,
                away TEXT NOT NULL,
                flashscore_url TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'scheduled'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS odds (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_id INTEGER NOT NULL REFERENCES events(id),
                market TEXT NOT NULL,
                line REAL,
                bookmaker TEXT NOT NULL,
                selection TEXT NOT NULL,
                odds REAL NOT NULL,
                captured_at_utc TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sport TEXT NOT NULL,
                league TEXT NOT NULL,
                event TEXT NOT NULL,
                start_time_utc TEXT,
                market TEXT NOT NULL,
                line REAL,
                selection TEXT NOT NULL,
                bookmaker TEXT NOT NULL,
                odds REAL NOT NULL,
                reason TEXT NOT NULL,
                score REAL NOT NULL,
                message TEXT,
                created_at_utc TEXT NOT NULL,
                sent_at_utc TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS game_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sport TEXT NOT NULL,
                league TEXT NOT NULL,
                home_team TEXT NOT NULL,
                away_team TEXT NOT NULL,
                home_score INTEGER,
                away_score INTEGER,
                game_date TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_odds_event_market ON odds(event_id, market)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_odds_captured ON odds(captured_at_utc)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_alerts_created ON alerts(created_at_utc)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_results_league_date ON game_results(league, game_date)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_alerts_dedupe ON alerts (
                sport, event, COALESCE(start_time_utc, ''), market,
                COALESCE(line, {}), selection, bookmaker, reason
            )
            "#,
            NULL_LINE_KEY
        ))
        .execute(&self.pool)
        .await?;

        info!("Database initialized");
        Ok(())
    }

    // ==================== EVENTS & ODDS ====================

    /// Insert or refresh an event keyed by its page URL, returning its id
    pub async fn upsert_event(&self, event: &DiscoveredEvent) -> Result<i64> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO events (sport, league, start_time_utc, home, away, flashscore_url, status)
            VALUES (?, ?, ?, ?, ?, ?, 'scheduled')
            ON CONFLICT(flashscore_url) DO UPDATE SET
                start_time_utc = COALESCE(excluded.start_time_utc, events.start_time_utc),
                home = excluded.home,
                away = excluded.away,
                league = excluded.league
            RETURNING id
            "#,
        )
        .bind(event.sport.as_str())
        .bind(&event.league)
        .bind(event.start_time_utc.as_ref().map(ts))
        .bind(&event.home)
        .bind(&event.away)
        .bind(&event.url)
        .fetch_one(&self.pool)
        .await
        .context("Failed to upsert event")?;

        Ok(id)
    }

    /// Store a batch of quotes for one event, returning rows written
    pub async fn insert_odds(
        &self,
        event_id: i64,
        quotes: &[OddsQuote],
        captured_at: DateTime<Utc>,
    ) -> Result<usize> {
        if quotes.is_empty() {
            return Ok(0);
        }

        let captured = ts(&captured_at);
        let mut tx = self.pool.begin().await?;
        for quote in quotes {
            sqlx::query(
                r#"
                INSERT INTO odds (event_id, market, line, bookmaker, selection, odds, captured_at_utc)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(event_id)
            .bind(&quote.market)
            .bind(quote.line)
            .bind(&quote.bookmaker)
            .bind(&quote.selection)
            .bind(quote.odds)
            .bind(&captured)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("Stored {} odds rows for event {}", quotes.len(), event_id);
        Ok(quotes.len())
    }

    /// Latest price per (event, market, line, selection, bookmaker) captured in the window
    pub async fn fetch_latest_odds_snapshot(
        &self,
        minutes: i64,
        sport: Option<&str>,
    ) -> Result<Vec<OddsRow>> {
        let since = ts(&(Utc::now() - Duration::minutes(minutes)));

        let rows = sqlx::query(&format!(
            r#"
            SELECT * FROM (
                SELECT o.event_id, e.sport, e.league, e.start_time_utc, e.home, e.away,
                       o.market, o.line, o.bookmaker, o.selection, o.odds, o.captured_at_utc,
                       ROW_NUMBER() OVER (
                           PARTITION BY o.event_id, o.market, COALESCE(o.line, {}),
                                        o.selection, o.bookmaker
                           ORDER BY o.captured_at_utc DESC, o.id DESC
                       ) AS rn
                FROM odds o
                JOIN events e ON e.id = o.event_id
                WHERE o.captured_at_utc >= ?
                  AND (? IS NULL OR LOWER(e.sport) = LOWER(?))
            )
            WHERE rn = 1
            ORDER BY event_id, market, line, selection, bookmaker
            "#,
            NULL_LINE_KEY
        ))
        .bind(&since)
        .bind(sport)
        .bind(sport)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(|row| row_to_odds(row).ok()).collect())
    }

    /// Price history of one pick at one bookmaker, oldest first
    pub async fn odds_history(
        &self,
        event_id: i64,
        market: &str,
        line: Option<f64>,
        selection: &str,
        bookmaker: &str,
        minutes: i64,
    ) -> Result<Vec<OddsPoint>> {
        let since = ts(&(Utc::now() - Duration::minutes(minutes)));

        let rows: Vec<(f64, String)> = sqlx::query_as(&format!(
            r#"
            SELECT odds, captured_at_utc FROM odds
            WHERE event_id = ? AND market = ? AND COALESCE(line, {0}) = COALESCE(?, {0})
              AND selection = ? AND bookmaker = ? AND captured_at_utc >= ?
            ORDER BY captured_at_utc ASC
            "#,
            NULL_LINE_KEY
        ))
        .bind(event_id)
        .bind(market)
        .bind(line)
        .bind(selection)
        .bind(bookmaker)
        .bind(&since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(odds, captured)| {
                parse_ts(&captured).map(|captured_at_utc| OddsPoint {
                    odds,
                    captured_at_utc,
                })
            })
            .collect())
    }

    // ==================== ALERTS ====================

    async fn insert_alert(&self, row: &OddsRow, reason: AlertReason, score: f64) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO alerts (
                sport, league, event, start_time_utc, market, line, selection,
                bookmaker, odds, reason, score, created_at_utc
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.sport)
        .bind(&row.league)
        .bind(row.event_label())
        .bind(row.start_time_utc.as_ref().map(ts))
        .bind(&row.market)
        .bind(row.line)
        .bind(&row.selection)
        .bind(&row.bookmaker)
        .bind(row.odds)
        .bind(reason.as_str())
        .bind(score)
        .bind(ts(&Utc::now()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(
                "Alert already exists: {} {} {} {}",
                row.event_label(),
                row.market,
                row.selection,
                row.bookmaker
            );
            return Ok(0);
        }

        Ok(result.last_insert_rowid())
    }

    /// Create an EV alert, returning 0 when the pick was already alerted
    pub async fn create_alert_ev(&self, row: &OddsRow, ev: f64) -> Result<i64> {
        self.insert_alert(row, AlertReason::Ev, ev).await
    }

    /// Create an anomaly alert scored by |z|, returning 0 when already alerted
    pub async fn create_alert_from_anomaly(&self, row: &OddsRow, score: f64) -> Result<i64> {
        self.insert_alert(row, AlertReason::Anomaly, score).await
    }

    /// Attach the rendered notification text to an alert
    pub async fn set_alert_message(&self, id: i64, message: &str) -> Result<()> {
        if id == 0 {
            return Ok(());
        }
        sqlx::query("UPDATE alerts SET message = ? WHERE id = ?")
            .bind(message)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Mark an alert as delivered
    pub async fn mark_sent(&self, id: i64) -> Result<()> {
        if id == 0 {
            return Ok(());
        }
        sqlx::query("UPDATE alerts SET sent_at_utc = ? WHERE id = ?")
            .bind(ts(&Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_alert(&self, id: i64) -> Result<Option<AlertRecord>> {
        let row = sqlx::query("SELECT * FROM alerts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row_to_alert(&row)?)),
            None => Ok(None),
        }
    }

    /// Most recent alerts, optionally by sport and market
    pub async fn get_latest_alerts(
        &self,
        limit: i64,
        sport: Option<&str>,
        market: Option<&str>,
    ) -> Result<Vec<AlertRecord>> {
        self.query_alerts(&AlertQuery {
            sport: sport.map(str::to_string),
            market: market.map(str::to_string),
            limit,
            ..Default::default()
        })
        .await
    }

    /// Filtered alert listing, newest first
    pub async fn query_alerts(&self, query: &AlertQuery) -> Result<Vec<AlertRecord>> {
        let reason = query.reason.map(|r| r.as_str());
        let sent = query.sent.map(i64::from);
        let limit = if query.limit > 0 { query.limit } else { 200 };

        let rows = sqlx::query(
            r#"
            SELECT * FROM alerts
            WHERE (? IS NULL OR LOWER(sport) = LOWER(?))
              AND (? IS NULL OR reason = ?)
              AND (? IS NULL OR UPPER(market) = UPPER(?))
              AND (? IS NULL OR LOWER(league) LIKE '%' || LOWER(?) || '%')
              AND (? IS NULL
                   OR (? = 1 AND sent_at_utc IS NOT NULL)
                   OR (? = 0 AND sent_at_utc IS NULL))
            ORDER BY created_at_utc DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(query.sport.as_deref())
        .bind(query.sport.as_deref())
        .bind(reason)
        .bind(reason)
        .bind(query.market.as_deref())
        .bind(query.market.as_deref())
        .bind(query.league.as_deref())
        .bind(query.league.as_deref())
        .bind(sent)
        .bind(sent)
        .bind(sent)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(|row| row_to_alert(row).ok()).collect())
    }

    /// Alert totals for the stats endpoint
    pub async fn alert_stats(&self) -> Result<AlertStats> {
        let (total, ev, anomalies, sent, last): (i64, i64, i64, i64, Option<String>) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(CASE WHEN reason = 'EV' THEN 1 ELSE 0 END), 0),
                       COALESCE(SUM(CASE WHEN reason = 'ANOMALY' THEN 1 ELSE 0 END), 0),
                       COALESCE(SUM(CASE WHEN sent_at_utc IS NOT NULL THEN 1 ELSE 0 END), 0),
                       MAX(created_at_utc)
                FROM alerts
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(AlertStats {
            total,
            ev,
            anomalies,
            sent,
            last_created: last.as_deref().and_then(parse_ts),
        })
    }

    /// Alert count per sport, busiest first
    pub async fn sport_counts(&self) -> Result<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT sport, COUNT(*) AS count FROM alerts
            GROUP BY sport
            ORDER BY count DESC, sport ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ==================== GAME RESULTS ====================

    pub async fn record_game_result(&self, game: &GameResult) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO game_results (sport, league, home_team, away_team, home_score, away_score, game_date)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&game.sport)
        .bind(&game.league)
        .bind(&game.home_team)
        .bind(&game.away_team)
        .bind(game.home_score)
        .bind(game.away_score)
        .bind(ts(&game.game_date))
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Recent finished games involving a team, newest first
    pub async fn team_games(
        &self,
        team: &str,
        league: &str,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<GameResult>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM game_results
            WHERE (home_team = ? OR away_team = ?)
              AND league = ?
              AND game_date >= ?
              AND home_score IS NOT NULL AND away_score IS NOT NULL
            ORDER BY game_date DESC
            LIMIT ?
            "#,
        )
        .bind(team)
        .bind(team)
        .bind(league)
        .bind(ts(&since))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(|row| row_to_game(row).ok()).collect())
    }

    /// Recent meetings between two teams in either venue, newest first
    pub async fn h2h_games(
        &self,
        home: &str,
        away: &str,
        league: &str,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<GameResult>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM game_results
            WHERE ((home_team = ? AND away_team = ?) OR (home_team = ? AND away_team = ?))
              AND league = ?
              AND game_date >= ?
              AND home_score IS NOT NULL AND away_score IS NOT NULL
            ORDER BY game_date DESC
            LIMIT ?
            "#,
        )
        .bind(home)
        .bind(away)
        .bind(away)
        .bind(home)
        .bind(league)
        .bind(ts(&since))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(|row| row_to_game(row).ok()).collect())
    }
}

fn row_to_odds(row: &SqliteRow) -> Result<OddsRow> {
    let start: Option<String> = row.get("start_time_utc");
    let captured: String = row.get("captured_at_utc");

    Ok(OddsRow {
        event_id: row.get("event_id"),
        sport: row.get("sport"),
        league: row.get("league"),
        start_time_utc: start.as_deref().and_then(parse_ts),
        home: row.get("home"),
        away: row.get("away"),
        market: row.get("market"),
        line: row.get("line"),
        bookmaker: row.get("bookmaker"),
        selection: row.get("selection"),
        odds: row.get("odds"),
        captured_at_utc: parse_ts(&captured).context("Invalid captured_at_utc")?,
    })
}

fn row_to_alert(row: &SqliteRow) -> Result<AlertRecord> {
    let start: Option<String> = row.get("start_time_utc");
    let created: String = row.get("created_at_utc");
    let sent: Option<String> = row.get("sent_at_utc");

    Ok(AlertRecord {
        id: row.get("id"),
        sport: row.get("sport"),
        league: row.get("league"),
        event: row.get("event"),
        start_time_utc: start.as_deref().and_then(parse_ts),
        market: row.get("market"),
        line: row.get("line"),
        selection: row.get("selection"),
        bookmaker: row.get("bookmaker"),
        odds: row.get("odds"),
        reason: row.get("reason"),
        score: row.get("score"),
        message: row.get("message"),
        created_at_utc: parse_ts(&created).context("Invalid created_at_utc")?,
        sent_at_utc: sent.as_deref().and_then(parse_ts),
    })
}

fn row_to_game(row: &SqliteRow) -> Result<GameResult> {
    let date: String = row.get("game_date");

    Ok(GameResult {
        sport: row.get("sport"),
        league: row.get("league"),
        home_team: row.get("home_team"),
        away_team: row.get("away_team"),
        home_score: row.get("home_score"),
        away_score: row.get("away_score"),
        game_date: parse_ts(&date).context("Invalid game_date")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sport;

    fn event(url: &str) -> DiscoveredEvent {
        DiscoveredEvent {
            sport: Sport::Basketball,
            league: "NBA".to_string(),
            start_time_utc: Some(Utc::now() + Duration::hours(3)),
            home: "Lakers".to_string(),
            away: "Celtics".to_string(),
            url: url.to_string(),
        }
    }

    fn quote(bookmaker: &str, selection: &str, odds: f64) -> OddsQuote {
        OddsQuote {
            market: "TOTAL".to_string(),
            line: Some(220.5),
            bookmaker: bookmaker.to_string(),
            selection: selection.to_string(),
            odds,
        }
    }

    async fn seeded() -> (Database, i64) {
        let db = Database::in_memory().await.unwrap();
        let id = db.upsert_event(&event("https://x/match/abc/")).await.unwrap();
        db.insert_odds(
            id,
            &[
                quote("Bet365", "OVER", 1.90),
                quote("Pinnacle", "OVER", 1.95),
                quote("Bet365", "UNDER", 1.90),
            ],
            Utc::now(),
        )
        .await
        .unwrap();
        (db, id)
    }

    #[tokio::test]
    async fn test_upsert_event_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        let first = db.upsert_event(&event("https://x/match/abc/")).await.unwrap();
        let mut renamed = event("https://x/match/abc/");
        renamed.home = "LA Lakers".to_string();
        let second = db.upsert_event(&renamed).await.unwrap();
        assert_eq!(first, second);

        let other = db.upsert_event(&event("https://x/match/def/")).await.unwrap();
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn test_snapshot_keeps_latest_price() {
        let (db, id) = seeded().await;
        db.insert_odds(id, &[quote("Bet365", "OVER", 2.05)], Utc::now() + Duration::seconds(1))
            .await
            .unwrap();

        let rows = db.fetch_latest_odds_snapshot(60, Some("basketball")).await.unwrap();
        assert_eq!(rows.len(), 3);
        let bet365_over = rows
            .iter()
            .find(|r| r.bookmaker == "Bet365" && r.selection == "OVER")
            .unwrap();
        assert!((bet365_over.odds - 2.05).abs() < 0.001);
        assert_eq!(bet365_over.home, "Lakers");

        let none = db.fetch_latest_odds_snapshot(60, Some("tennis")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_alert_dedupe_and_mark_sent() {
        let (db, _) = seeded().await;
        let rows = db.fetch_latest_odds_snapshot(60, None).await.unwrap();
        let row = &rows[0];

        let id = db.create_alert_ev(row, 0.05).await.unwrap();
        assert!(id > 0);
        assert_eq!(db.create_alert_ev(row, 0.07).await.unwrap(), 0);
        // Different reason is a different alert
        assert!(db.create_alert_from_anomaly(row, 2.4).await.unwrap() > 0);

        db.mark_sent(0).await.unwrap();
        db.mark_sent(id).await.unwrap();
        let alert = db.get_alert(id).await.unwrap().unwrap();
        assert!(alert.is_sent());
        assert_eq!(alert.event, "Lakers vs Celtics");
    }

    #[tokio::test]
    async fn test_alert_dedupe_without_line() {
        let db = Database::in_memory().await.unwrap();
        let id = db.upsert_event(&event("https://x/match/ml/")).await.unwrap();
        let mut q = quote("Bet365", "HOME", 1.8);
        q.market = "MONEYLINE".to_string();
        q.line = None;
        db.insert_odds(id, &[q], Utc::now()).await.unwrap();

        let rows = db.fetch_latest_odds_snapshot(60, None).await.unwrap();
        assert!(db.create_alert_from_anomaly(&rows[0], 2.0).await.unwrap() > 0);
        assert_eq!(db.create_alert_from_anomaly(&rows[0], 2.0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_query_alerts_and_stats() {
        let (db, _) = seeded().await;
        let rows = db.fetch_latest_odds_snapshot(60, None).await.unwrap();
        let ev_id = db.create_alert_ev(&rows[0], 0.05).await.unwrap();
        db.create_alert_from_anomaly(&rows[1], 2.1).await.unwrap();
        db.mark_sent(ev_id).await.unwrap();

        let stats = db.alert_stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.ev, 1);
        assert_eq!(stats.anomalies, 1);
        assert_eq!(stats.sent, 1);
        assert!(stats.last_created.is_some());

        let sent = db
            .query_alerts(&AlertQuery {
                sent: Some(true),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id, ev_id);

        let upper = db
            .query_alerts(&AlertQuery {
                sport: Some("BASKETBALL".to_string()),
                reason: Some(AlertReason::Anomaly),
                league: Some("nb".to_string()),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(upper.len(), 1);

        let counts = db.sport_counts().await.unwrap();
        assert_eq!(counts, vec![("basketball".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_odds_history() {
        let (db, id) = seeded().await;
        db.insert_odds(id, &[quote("Bet365", "OVER", 1.85)], Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        let history = db
            .odds_history(id, "TOTAL", Some(220.5), "OVER", "Bet365", 60)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert!((history[1].odds - 1.85).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_team_and_h2h_games() {
        let db = Database::in_memory().await.unwrap();
        let now = Utc::now();
        for (i, (home, away, hs, as_)) in [
            ("Lakers", "Celtics", 110, 100),
            ("Celtics", "Lakers", 120, 115),
            ("Lakers", "Heat", 99, 101),
        ]
        .iter()
        .enumerate()
        {
            db.record_game_result(&GameResult {
                sport: "basketball".to_string(),
                league: "NBA".to_string(),
                home_team: home.to_string(),
                away_team: away.to_string(),
                home_score: *hs,
                away_score: *as_,
                game_date: now - Duration::days(i as i64 + 1),
            })
            .await
            .unwrap();
        }

        let since = now - Duration::days(30);
        let lakers = db.team_games("Lakers", "NBA", since, 10).await.unwrap();
        assert_eq!(lakers.len(), 3);
        assert_eq!(lakers[0].away_team, "Celtics");

        let h2h = db.h2h_games("Lakers", "Celtics", "NBA", since, 5).await.unwrap();
        assert_eq!(h2h.len(), 2);
    }
}
