//! Scheduled work: odds ingestion, anomaly scans and EV scans per sport

pub mod anomaly;
pub mod basketball;
pub mod ev;
pub mod ingest;
pub mod smoke;

use crate::config::Config;
use crate::db::Database;
use crate::decision::BasketballStatsEngine;
use crate::ingest::{EventDiscovery, FlashscoreProvider, PageFetcher};
use crate::services::Metrics;
use crate::telegram::TelegramNotifier;
use crate::types::Sport;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

pub use anomaly::run_anomalies;
pub use basketball::run_basketball_ev;
pub use ev::run_model_ev;
pub use ingest::{run_ingest, IngestSummary};
pub use smoke::run_smoke;

/// Snapshot window in minutes used by the scans of a sport
pub fn snapshot_window(sport: Sport) -> i64 {
    match sport {
        Sport::Basketball => 60,
        Sport::Football | Sport::Tennis => 30,
    }
}

/// Counts reported by a scan job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub rows: usize,
    /// Anomaly hits, or picks that cleared the EV gate
    pub candidates: usize,
    /// New alerts stored (deduplicated picks excluded)
    pub alerts: usize,
    /// Alerts delivered to Telegram
    pub delivered: usize,
    /// Pricing errors flagged by the basketball scan
    pub pricing_errors: usize,
}

/// Everything a job needs, shared across the scheduler tasks
pub struct JobContext {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub metrics: Metrics,
    pub provider: FlashscoreProvider,
    pub discovery: EventDiscovery,
    pub telegram: Option<TelegramNotifier>,
    pub stats: BasketballStatsEngine,
    /// Pricing errors already reported by this process
    reported_errors: Mutex<HashSet<String>>,
}

impl JobContext {
    pub fn new(db: Arc<Database>, config: Arc<Config>, metrics: Metrics) -> Result<Self> {
        let fetcher = PageFetcher::new(config.scraper.clone(), metrics.clone())
            .context("Failed to build page fetcher")?;
        let telegram = TelegramNotifier::from_config(&config.telegram);

        Ok(Self {
            stats: BasketballStatsEngine::new(Some(db.clone())),
            provider: FlashscoreProvider::new(fetcher.clone()),
            discovery: EventDiscovery::new(fetcher),
            db,
            config,
            metrics,
            telegram,
            reported_errors: Mutex::new(HashSet::new()),
        })
    }

    /// Replace the notifier (used to point at a stub Bot API)
    pub fn with_telegram(mut self, telegram: Option<TelegramNotifier>) -> Self {
        self.telegram = telegram;
        self
    }

    /// Store the message on a new alert and push it to Telegram.
    /// The alert is marked sent only when delivery succeeds.
    pub async fn deliver(&self, alert_id: i64, message: &str) -> Result<bool> {
        self.db.set_alert_message(alert_id, message).await?;

        let Some(telegram) = &self.telegram else {
            debug!("Alert {} stored, Telegram disabled", alert_id);
            return Ok(false);
        };

        match telegram.send(message).await {
            Ok(()) => {
                self.metrics.record_telegram(true);
                self.db.mark_sent(alert_id).await?;
                Ok(true)
            }
            Err(e) => {
                self.metrics.record_telegram(false);
                error!("Alert {} not delivered: {}", alert_id, e);
                Ok(false)
            }
        }
    }

    /// True the first time a pricing-error key is seen
    async fn claim_error(&self, key: String) -> bool {
        self.reported_errors.lock().await.insert(key)
    }

    async fn release_error(&self, key: &str) {
        self.reported_errors.lock().await.remove(key);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::types::{DiscoveredEvent, OddsQuote};
    use chrono::{Duration, Utc};

    pub async fn context() -> JobContext {
        let db = Arc::new(Database::in_memory().await.unwrap());
        JobContext::new(db, Arc::new(Config::default()), Metrics::new())
            .unwrap()
            .with_telegram(None)
    }

    pub async fn seed_event(
        ctx: &JobContext,
        sport: Sport,
        league: &str,
        url: &str,
        quotes: &[OddsQuote],
    ) -> i64 {
        let event = DiscoveredEvent {
            sport,
            league: league.to_string(),
            start_time_utc: Some(Utc::now() + Duration::hours(4)),
            home: "Home FC".to_string(),
            away: "Away FC".to_string(),
            url: url.to_string(),
        };
        let id = ctx.db.upsert_event(&event).await.unwrap();
        ctx.db.insert_odds(id, quotes, Utc::now()).await.unwrap();
        id
    }

    pub fn quote(market: &str, line: Option<f64>, bookmaker: &str, selection: &str, odds: f64) -> OddsQuote {
        OddsQuote {
            market: market.to_string(),
            line,
            bookmaker: bookmaker.to_string(),
            selection: selection.to_string(),
            odds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::config::TelegramConfig;
    use axum::{routing::post, Router};

    async fn stub_bot() -> String {
        let app = Router::new().route("/bottok/sendMessage", post(|| async { "{}" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_snapshot_window() {
        assert_eq!(snapshot_window(Sport::Basketball), 60);
        assert_eq!(snapshot_window(Sport::Tennis), 30);
    }

    #[tokio::test]
    async fn test_deliver_without_telegram_keeps_alert_pending() {
        let ctx = context().await;
        seed_event(&ctx, Sport::Basketball, "NBA", "https://x/match/a1/", &[
            quote("TOTAL", Some(220.5), "Bet365", "OVER", 1.9),
        ])
        .await;
        let row = ctx.db.fetch_latest_odds_snapshot(60, None).await.unwrap().remove(0);
        let id = ctx.db.create_alert_ev(&row, 0.05).await.unwrap();

        assert!(!ctx.deliver(id, "hola").await.unwrap());
        let alert = ctx.db.get_alert(id).await.unwrap().unwrap();
        assert_eq!(alert.message.as_deref(), Some("hola"));
        assert!(!alert.is_sent());
    }

    #[tokio::test]
    async fn test_deliver_marks_sent() {
        let base = stub_bot().await;
        let telegram = TelegramNotifier::from_config(&TelegramConfig {
            bot_token: Some("tok".to_string()),
            chat_id: Some("1".to_string()),
            timeout_secs: 2,
            max_attempts: 1,
        })
        .map(|t| t.with_api_base(base));
        let ctx = context().await.with_telegram(telegram);

        seed_event(&ctx, Sport::Basketball, "NBA", "https://x/match/a2/", &[
            quote("TOTAL", Some(220.5), "Bet365", "OVER", 1.9),
        ])
        .await;
        let row = ctx.db.fetch_latest_odds_snapshot(60, None).await.unwrap().remove(0);
        let id = ctx.db.create_alert_ev(&row, 0.05).await.unwrap();

        assert!(ctx.deliver(id, "hola").await.unwrap());
        assert!(ctx.db.get_alert(id).await.unwrap().unwrap().is_sent());
        assert_eq!(ctx.metrics.snapshot().await.telegram_sent, 1);
    }

    #[tokio::test]
    async fn test_claim_error_once() {
        let ctx = context().await;
        assert!(ctx.claim_error("k".to_string()).await);
        assert!(!ctx.claim_error("k".to_string()).await);
        ctx.release_error("k").await;
        assert!(ctx.claim_error("k".to_string()).await);
    }
}
