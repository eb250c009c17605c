//! Scraper error types and scraped-data validation

use crate::services::retry::Retryable;
use crate::types::{DiscoveredEvent, OddsQuote};
use std::time::Duration;
use thiserror::Error;

pub const MIN_VALID_ODDS: f64 = 1.01;
pub const MAX_VALID_ODDS: f64 = 1000.0;

/// Errors raised while fetching or parsing odds pages
#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Rate limited by {url}")]
    RateLimited { url: String, retry_after: Option<u64> },

    #[error("Parsing failed: {0}")]
    Parsing(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Invalid HTML from {url}: {reason}")]
    InvalidHtml { url: String, reason: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication required for {url} (HTTP {status})")]
    Authentication { url: String, status: u16 },

    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("Data validation failed: {0}")]
    DataValidation(String),

    #[error("Circuit breaker open, request rejected")]
    CircuitOpen,
}

impl ScraperError {
    /// Map a non-success HTTP status to the matching error
    pub fn from_status(status: u16, url: &str, retry_after: Option<u64>) -> Self {
        match status {
            429 => ScraperError::RateLimited {
                url: url.to_string(),
                retry_after,
            },
            401 | 403 => ScraperError::Authentication {
                url: url.to_string(),
                status,
            },
            404 => ScraperError::EventNotFound(url.to_string()),
            _ => ScraperError::Http {
                url: url.to_string(),
                status,
            },
        }
    }

    /// Short name used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ScraperError::RateLimited { .. } => "rate_limited",
            ScraperError::Parsing(_) => "parsing",
            ScraperError::EventNotFound(_) => "event_not_found",
            ScraperError::InvalidHtml { .. } => "invalid_html",
            ScraperError::Network(_) => "network",
            ScraperError::Authentication { .. } => "authentication",
            ScraperError::Http { .. } => "http",
            ScraperError::DataValidation(_) => "data_validation",
            ScraperError::CircuitOpen => "circuit_open",
        }
    }
}

impl From<reqwest::Error> for ScraperError {
    fn from(err: reqwest::Error) -> Self {
        ScraperError::Network(err.to_string())
    }
}

impl Retryable for ScraperError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScraperError::Network(_)
                | ScraperError::RateLimited { .. }
                | ScraperError::InvalidHtml { .. }
                | ScraperError::Http { .. }
        )
    }

    fn backoff_multiplier(&self) -> f64 {
        match self {
            ScraperError::RateLimited { .. } => 2.0,
            _ => 1.0,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            ScraperError::RateLimited {
                retry_after: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

pub fn is_valid_odds(odds: f64) -> bool {
    (MIN_VALID_ODDS..=MAX_VALID_ODDS).contains(&odds)
}

/// Reject discovered events that cannot be stored
pub fn validate_event(event: &DiscoveredEvent) -> Result<(), ScraperError> {
    if event.home.trim().is_empty() || event.away.trim().is_empty() {
        return Err(ScraperError::DataValidation(format!(
            "missing participants for {}",
            event.url
        )));
    }
    if event.league.trim().is_empty() {
        return Err(ScraperError::DataValidation(format!(
            "missing league for {}",
            event.url
        )));
    }
    if !event.url.starts_with("http") {
        return Err(ScraperError::DataValidation(format!(
            "invalid event url: {}",
            event.url
        )));
    }
    Ok(())
}

/// Reject quotes with empty fields or odds outside the accepted range
pub fn validate_quote(quote: &OddsQuote) -> Result<(), ScraperError> {
    if quote.market.is_empty() || quote.selection.is_empty() || quote.bookmaker.trim().is_empty() {
        return Err(ScraperError::DataValidation(format!(
            "incomplete quote: {:?}",
            quote
        )));
    }
    if !is_valid_odds(quote.odds) {
        return Err(ScraperError::DataValidation(format!(
            "odds {} out of range for {} {}",
            quote.odds, quote.bookmaker, quote.selection
        )));
    }
    if let Some(line) = quote.line {
        if !line.is_finite() {
            return Err(ScraperError::DataValidation("non-finite line".to_string()));
        }
    }
    Ok(())
}
