//! Telegram Bot API notifications

use crate::config::TelegramConfig;
use crate::decision::error_detection::{format_error_cuota_message, ErrorDetection};
use crate::types::OddsRow;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

const TELEGRAM_API: &str = "https://api.telegram.org";
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;
const MAX_RETRY_WAIT_SECS: u64 = 30;

/// Wait before retry `attempt` after a network failure
fn backoff_secs(attempt: u32) -> u64 {
    2u64.saturating_pow(attempt).min(MAX_RETRY_WAIT_SECS)
}

/// Server-requested wait, capped
fn retry_wait_secs(retry_after: u64) -> u64 {
    retry_after.min(MAX_RETRY_WAIT_SECS)
}

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Telegram request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Telegram send gave up after {0} attempts")]
    Exhausted(u32),
}

/// Sends HTML messages to a single chat
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
    max_attempts: u32,
}

impl TelegramNotifier {
    /// None when the bot token or chat id is missing
    pub fn from_config(config: &TelegramConfig) -> Option<Self> {
        match (&config.bot_token, &config.chat_id) {
            (Some(token), Some(chat_id)) => {
                let client = Client::builder()
                    .timeout(Duration::from_secs(config.timeout_secs.max(1)))
                    .build()
                    .ok()?;
                Some(Self {
                    client,
                    api_base: TELEGRAM_API.to_string(),
                    bot_token: token.clone(),
                    chat_id: chat_id.clone(),
                    max_attempts: config.max_attempts.max(1),
                })
            }
            _ => {
                warn!("⚠️ Telegram no configurado");
                None
            }
        }
    }

    /// Point the client at another Bot API host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }

    /// Send an HTML message.
    ///
    /// Network failures back off 2^attempt seconds and 429 honours `Retry-After`,
    /// both capped at `MAX_RETRY_WAIT_SECS`. Any other HTTP error stops immediately.
    pub async fn send(&self, text: &str) -> Result<(), TelegramError> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        for attempt in 0..self.max_attempts {
            let last = attempt + 1 == self.max_attempts;

            match self.client.post(self.send_url()).json(&payload).send().await {
                Ok(response) if response.status().is_success() => {
                    info!("✅ Telegram message sent");
                    return Ok(());
                }
                Ok(response) => {
                    let status = response.status();
                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.trim().parse::<u64>().ok())
                        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                    let body = response.text().await.unwrap_or_default();
                    error!("❌ Telegram HTTP error {}: {}", status, body);

                    if status != StatusCode::TOO_MANY_REQUESTS || last {
                        return Err(TelegramError::Http {
                            status: status.as_u16(),
                            body,
                        });
                    }
                    tokio::time::sleep(Duration::from_secs(retry_wait_secs(retry_after))).await;
                }
                Err(e) => {
                    if e.is_timeout() {
                        warn!("⏱️ Timeout Telegram ({}/{})", attempt + 1, self.max_attempts);
                    } else {
                        error!("❌ Telegram error: {}", e);
                    }
                    if last {
                        return Err(TelegramError::Request(e));
                    }
                    tokio::time::sleep(Duration::from_secs(backoff_secs(attempt))).await;
                }
            }
        }

        Err(TelegramError::Exhausted(self.max_attempts))
    }

    /// Send the pricing-error message only for actionable detections.
    /// Returns whether a message went out.
    pub async fn maybe_send_error_cuota(&self, row: &OddsRow, detection: &ErrorDetection) -> bool {
        if !detection.is_actionable() {
            return false;
        }
        match self.send(&format_error_cuota_message(row, detection)).await {
            Ok(()) => true,
            Err(e) => {
                error!("Error alert for {} not delivered: {}", row.event_label(), e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode as AxumStatus, routing::post, Router};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn configured() -> TelegramConfig {
        TelegramConfig {
            bot_token: Some("123abc".to_string()),
            chat_id: Some("42".to_string()),
            timeout_secs: 2,
            max_attempts: 3,
        }
    }

    /// Local Bot API stub answering each call with the next status in `statuses`
    async fn stub(statuses: Vec<u16>) -> (String, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let state = (calls.clone(), Arc::new(statuses));

        async fn handler(
            State((calls, statuses)): State<(Arc<AtomicU32>, Arc<Vec<u16>>)>,
        ) -> (AxumStatus, [(&'static str, &'static str); 1], &'static str) {
            let n = calls.fetch_add(1, Ordering::SeqCst) as usize;
            let code = statuses.get(n).copied().unwrap_or(200);
            (
                AxumStatus::from_u16(code).unwrap(),
                [("retry-after", "0")],
                "{}",
            )
        }

        let app = Router::new()
            .route("/bot123abc/sendMessage", post(handler))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), calls)
    }

    #[test]
    fn test_from_config_requires_credentials() {
        assert!(TelegramNotifier::from_config(&TelegramConfig::default()).is_none());
        assert!(TelegramNotifier::from_config(&configured()).is_some());
    }

    #[test]
    fn test_retry_waits_are_capped() {
        assert_eq!(backoff_secs(0), 1);
        assert_eq!(backoff_secs(3), 8);
        assert_eq!(backoff_secs(10), MAX_RETRY_WAIT_SECS);
        assert_eq!(backoff_secs(64), MAX_RETRY_WAIT_SECS);
        assert_eq!(backoff_secs(u32::MAX), MAX_RETRY_WAIT_SECS);
        assert_eq!(retry_wait_secs(2), 2);
        assert_eq!(retry_wait_secs(86_400), MAX_RETRY_WAIT_SECS);
    }

    #[tokio::test]
    async fn test_send_success() {
        let (base, calls) = stub(vec![200]).await;
        let notifier = TelegramNotifier::from_config(&configured())
            .unwrap()
            .with_api_base(base);
        assert!(notifier.send("<b>hola</b>").await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_send_retries_on_429() {
        let (base, calls) = stub(vec![429, 200]).await;
        let notifier = TelegramNotifier::from_config(&configured())
            .unwrap()
            .with_api_base(base);
        assert!(notifier.send("hola").await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_send_stops_on_client_error() {
        let (base, calls) = stub(vec![400, 200]).await;
        let notifier = TelegramNotifier::from_config(&configured())
            .unwrap()
            .with_api_base(base);
        let err = notifier.send("hola").await.unwrap_err();
        assert!(matches!(err, TelegramError::Http { status: 400, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
