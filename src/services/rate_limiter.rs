//! Rate Limiter - request pacing with random jitter
//!
//! A single-token bucket: one request is allowed per refill interval, and the
//! interval is re-drawn after every request as `base ± variance`, never
//! shorter than the configured minimum.

use crate::config::ScraperConfig;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

struct PaceBucket {
    last_request: Option<Instant>,
    interval: Duration,
}

impl PaceBucket {
    /// Time until the next request may go out
    fn time_until_available(&self, now: Instant) -> Duration {
        match self.last_request {
            Some(last) => self.interval.saturating_sub(now.duration_since(last)),
            None => Duration::ZERO,
        }
    }
}

/// Shared pacer for outbound page requests
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<Mutex<PaceBucket>>,
    base_ms: u64,
    variance_ms: u64,
    min_ms: u64,
}

impl RateLimiter {
    pub fn new(base_ms: u64, variance_ms: u64, min_ms: u64) -> Self {
        Self {
            bucket: Arc::new(Mutex::new(PaceBucket {
                last_request: None,
                interval: Duration::ZERO,
            })),
            base_ms,
            variance_ms,
            min_ms,
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(config.delay_ms, config.delay_variance_ms, config.min_delay_ms)
    }

    /// Next interval: base plus uniform jitter, floored at the minimum
    pub fn jittered_delay(&self) -> Duration {
        let variance = self.variance_ms as i64;
        let jitter = if variance > 0 {
            rand::thread_rng().gen_range(-variance..=variance)
        } else {
            0
        };
        let ms = (self.base_ms as i64 + jitter).max(self.min_ms as i64);
        Duration::from_millis(ms as u64)
    }

    /// Wait for the pacing interval, then claim the slot.
    /// Returns true if we had to wait.
    pub async fn acquire(&self) -> bool {
        let mut bucket = self.bucket.lock().await;
        let wait = bucket.time_until_available(Instant::now());
        let waited = !wait.is_zero();

        if waited {
            debug!("Rate limiting: sleeping {:.2}s", wait.as_secs_f64());
            tokio::time::sleep(wait).await;
        }

        bucket.last_request = Some(Instant::now());
        bucket.interval = self.jittered_delay();
        waited
    }

    /// Forget the last request so the next one goes out immediately
    pub async fn reset(&self) {
        let mut bucket = self.bucket.lock().await;
        bucket.last_request = None;
    }
}
