//! Process-wide counters for ingestion, alerting and jobs

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Fetcher
    pub pages_fetched: u64,
    pub pages_failed: u64,
    pub rate_limit_waits: u64,
    pub circuit_rejections: u64,
    /// Ingestion
    pub events_ingested: u64,
    pub odds_ingested: u64,
    /// Alerts
    pub alerts_created: u64,
    pub alerts_deduped: u64,
    pub telegram_sent: u64,
    pub telegram_failed: u64,
    /// Scheduler
    pub job_runs: u64,
    pub job_failures: u64,
    pub last_job_error: Option<String>,
}

/// Thread-safe metrics collector
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    pages_fetched: AtomicU64,
    pages_failed: AtomicU64,
    rate_limit_waits: AtomicU64,
    circuit_rejections: AtomicU64,
    events_ingested: AtomicU64,
    odds_ingested: AtomicU64,
    alerts_created: AtomicU64,
    alerts_deduped: AtomicU64,
    telegram_sent: AtomicU64,
    telegram_failed: AtomicU64,
    job_runs: AtomicU64,
    job_failures: AtomicU64,
    last_job_error: RwLock<Option<String>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_pages_fetched(&self) {
        self.inner.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_pages_failed(&self) {
        self.inner.pages_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rate_limit_waits(&self) {
        self.inner.rate_limit_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_circuit_rejections(&self) {
        self.inner.circuit_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_events_ingested(&self, n: u64) {
        self.inner.events_ingested.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_odds_ingested(&self, n: u64) {
        self.inner.odds_ingested.fetch_add(n, Ordering::Relaxed);
    }

    /// Count an alert insert attempt; `created` is false when it hit the dedupe key
    pub fn record_alert(&self, created: bool) {
        if created {
            self.inner.alerts_created.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.alerts_deduped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_telegram(&self, ok: bool) {
        if ok {
            self.inner.telegram_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.telegram_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn inc_job_runs(&self) {
        self.inner.job_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn record_job_failure(&self, job: &str, error: &str) {
        self.inner.job_failures.fetch_add(1, Ordering::Relaxed);
        *self.inner.last_job_error.write().await = Some(format!("{}: {}", job, error));
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let last_job_error = self.inner.last_job_error.read().await.clone();
        MetricsSnapshot {
            pages_fetched: self.inner.pages_fetched.load(Ordering::Relaxed),
            pages_failed: self.inner.pages_failed.load(Ordering::Relaxed),
            rate_limit_waits: self.inner.rate_limit_waits.load(Ordering::Relaxed),
            circuit_rejections: self.inner.circuit_rejections.load(Ordering::Relaxed),
            events_ingested: self.inner.events_ingested.load(Ordering::Relaxed),
            odds_ingested: self.inner.odds_ingested.load(Ordering::Relaxed),
            alerts_created: self.inner.alerts_created.load(Ordering::Relaxed),
            alerts_deduped: self.inner.alerts_deduped.load(Ordering::Relaxed),
            telegram_sent: self.inner.telegram_sent.load(Ordering::Relaxed),
            telegram_failed: self.inner.telegram_failed.load(Ordering::Relaxed),
            job_runs: self.inner.job_runs.load(Ordering::Relaxed),
            job_failures: self.inner.job_failures.load(Ordering::Relaxed),
            last_job_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counters() {
        let metrics = Metrics::new();
        metrics.inc_pages_fetched();
        metrics.add_odds_ingested(12);
        metrics.record_alert(true);
        metrics.record_alert(false);
        metrics.record_telegram(false);
        metrics.record_job_failure("basketball_ingest", "timeout").await;

        let snap = metrics.snapshot().await;
        assert_eq!(snap.pages_fetched, 1);
        assert_eq!(snap.odds_ingested, 12);
        assert_eq!(snap.alerts_created, 1);
        assert_eq!(snap.alerts_deduped, 1);
        assert_eq!(snap.telegram_failed, 1);
        assert_eq!(snap.job_failures, 1);
        assert_eq!(snap.last_job_error.as_deref(), Some("basketball_ingest: timeout"));
    }
}
