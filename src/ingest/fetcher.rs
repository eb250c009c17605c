//! HTTP page fetcher with pacing, retry and a circuit breaker

use crate::config::ScraperConfig;
use crate::ingest::errors::ScraperError;
use crate::services::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::services::metrics::Metrics;
use crate::services::rate_limiter::RateLimiter;
use crate::services::retry::{with_retry, RetryConfig};
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENTS: [&str; 8] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

const GOOGLE_REFERER: &str = "https://www.google.com/";

/// Bytes of the body scanned for an error marker
const ERROR_SCAN_CHARS: usize = 500;

/// Headers for one request: random user agent, and a Google referer half the time
pub fn browser_headers() -> HeaderMap {
    let mut rng = rand::thread_rng();
    let mut headers = HeaderMap::new();

    let ua = USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0]);
    headers.insert(header::USER_AGENT, HeaderValue::from_static(ua));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9,es;q=0.8"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));

    if rng.gen_bool(0.5) {
        headers.insert(header::REFERER, HeaderValue::from_static(GOOGLE_REFERER));
    }
    headers
}

/// Accept a page only if it is long enough and does not open with an error marker
pub fn validate_response(url: &str, body: &str, min_length: usize) -> Result<(), ScraperError> {
    if body.len() < min_length {
        return Err(ScraperError::InvalidHtml {
            url: url.to_string(),
            reason: format!("content too short ({} < {})", body.len(), min_length),
        });
    }

    let head: String = body.chars().take(ERROR_SCAN_CHARS).collect();
    if head.to_lowercase().contains("error") {
        return Err(ScraperError::InvalidHtml {
            url: url.to_string(),
            reason: "error marker in page header".to_string(),
        });
    }
    Ok(())
}

/// Shared fetcher for listing and odds pages
#[derive(Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    config: ScraperConfig,
    retry: RetryConfig,
    limiter: RateLimiter,
    breaker: CircuitBreaker,
    metrics: Metrics,
}

impl PageFetcher {
    pub fn new(config: ScraperConfig, metrics: Metrics) -> Result<Self, ScraperError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            retry: RetryConfig::from(&config),
            limiter: RateLimiter::from_config(&config),
            breaker: CircuitBreaker::new(
                config.failure_threshold,
                Duration::from_secs(config.recovery_timeout_secs),
            ),
            config,
            metrics,
        })
    }

    pub async fn circuit_state(&self) -> CircuitState {
        self.breaker.state().await
    }

    /// Fetch a page through the circuit breaker with retry.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        if !self.breaker.allow().await {
            self.metrics.inc_circuit_rejections();
            warn!("Circuit open, skipping {}", url);
            return Err(ScraperError::CircuitOpen);
        }

        let result = with_retry(&self.retry, url, || self.fetch_once(url)).await;

        match &result {
            Ok(body) => {
                self.breaker.record_success().await;
                self.metrics.inc_pages_fetched();
                debug!("Fetched {} ({} bytes)", url, body.len());
            }
            Err(e) => {
                self.breaker.record_failure().await;
                self.metrics.inc_pages_failed();
                warn!("Fetch failed for {} [{}]: {}", url, e.kind(), e);
            }
        }
        result
    }

    async fn fetch_once(&self, url: &str) -> Result<String, ScraperError> {
        if self.limiter.acquire().await {
            self.metrics.inc_rate_limit_waits();
        }

        let response = self
            .client
            .get(url)
            .headers(browser_headers())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            warn!("Request failed with status {} for {}", status, url);
            return Err(ScraperError::from_status(status.as_u16(), url, retry_after));
        }

        let body = response.text().await?;
        validate_response(url, &body, self.config.min_content_length)?;
        Ok(body)
    }
}
