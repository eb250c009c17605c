//! BetDesk library
//!
//! Odds monitoring for basketball, football and tennis:
//!
//! 1. **Ingestion**: discover upcoming events on Flashscore and store every
//!    bookmaker quote in SQLite.
//! 2. **Decision engine**: flag outlier prices (z-score anomalies) and
//!    positive expected value picks from per-sport models.
//! 3. **Delivery**: push alerts to Telegram and serve them to the dashboard
//!    through a small JSON API.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod decision;
pub mod formatters;
pub mod ingest;
pub mod jobs;
pub mod scheduler;
pub mod services;
pub mod sports;
pub mod telegram;
pub mod types;

pub use config::Config;
pub use db::Database;
pub use jobs::JobContext;
pub use telegram::TelegramNotifier;
pub use types::{AlertReason, Sport};
