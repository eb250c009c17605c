//! Configuration management for betdesk

use anyhow::Result;
use std::env;
use std::str::FromStr;

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database
    pub database_path: String,

    /// Address the API server binds to
    pub api_host: String,
    pub api_port: u16,

    /// Origins allowed by the CORS layer
    pub allowed_origins: Vec<String>,

    /// Base URL the dashboard client talks to
    pub api_base_url: String,

    /// Telegram bot credentials (optional)
    pub telegram: TelegramConfig,

    /// HTTP basic auth for the HTML alert table
    pub dashboard_auth: DashboardAuth,

    /// Odds page fetcher settings
    pub scraper: ScraperConfig,

    /// Background job intervals
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    /// Per-request timeout in seconds (default: 15)
    pub timeout_secs: u64,
    /// Send attempts per message (default: 3)
    pub max_attempts: u32,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct DashboardAuth {
    pub username: String,
    pub password: String,
}

impl Default for DashboardAuth {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

/// Fetcher pacing, retry and circuit breaker settings
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Base delay between requests in milliseconds (default: 2000)
    pub delay_ms: u64,
    /// Random jitter added or removed from the delay (default: 1000)
    pub delay_variance_ms: u64,
    /// Lower bound for a jittered delay (default: 500)
    pub min_delay_ms: u64,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Connect timeout in seconds (default: 10)
    pub connect_timeout_secs: u64,
    /// Retries after the first attempt (default: 3)
    pub max_retries: u32,
    /// First retry delay in milliseconds (default: 5000)
    pub retry_delay_ms: u64,
    /// Retry delay multiplier (default: 2.0)
    pub backoff_factor: f64,
    /// Consecutive failures before the circuit opens (default: 5)
    pub failure_threshold: u32,
    /// Seconds the circuit stays open (default: 300)
    pub recovery_timeout_secs: u64,
    /// Minimum body length for a page to be accepted (default: 1000)
    pub min_content_length: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            delay_ms: 2000,
            delay_variance_ms: 1000,
            min_delay_ms: 500,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 3,
            retry_delay_ms: 5000,
            backoff_factor: 2.0,
            failure_threshold: 5,
            recovery_timeout_secs: 300,
            min_content_length: 1000,
        }
    }
}

/// Telegram message layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertStyle {
    #[default]
    Standard,
    Improved,
}

impl FromStr for AlertStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(AlertStyle::Standard),
            "improved" | "mejorado" => Ok(AlertStyle::Improved),
            other => Err(format!("Unknown alert style: {}", other)),
        }
    }
}

/// Job cadence per sport, in seconds
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Layout for anomaly and football/tennis EV messages
    pub alert_style: AlertStyle,
    pub basketball_ingest_secs: u64,
    pub football_ingest_secs: u64,
    pub tennis_ingest_secs: u64,
    pub basketball_anomaly_secs: u64,
    pub football_anomaly_secs: u64,
    pub tennis_anomaly_secs: u64,
    pub basketball_ev_secs: u64,
    pub football_ev_secs: u64,
    pub tennis_ev_secs: u64,
    pub smoke_secs: u64,
    /// Page fetched by the smoke job
    pub smoke_url: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            alert_style: AlertStyle::Standard,
            basketball_ingest_secs: 10 * 60,
            football_ingest_secs: 15 * 60,
            tennis_ingest_secs: 20 * 60,
            basketball_anomaly_secs: 2 * 60,
            football_anomaly_secs: 3 * 60,
            tennis_anomaly_secs: 3 * 60,
            basketball_ev_secs: 2 * 60,
            football_ev_secs: 5 * 60,
            tennis_ev_secs: 5 * 60,
            smoke_secs: 60 * 60,
            smoke_url: "https://www.flashscore.com/basketball/".to_string(),
        }
    }
}

fn default_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://localhost:8000".to_string(),
        "http://127.0.0.1:8000".to_string(),
    ]
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_nonempty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "betdesk.db".to_string());

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env_parse("API_PORT", 8000u16);

        let allowed_origins = env_nonempty("ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(default_origins);

        let api_base_url = env::var("BETDESK_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        let telegram = TelegramConfig {
            bot_token: env_nonempty("TELEGRAM_BOT_TOKEN"),
            chat_id: env_nonempty("TELEGRAM_CHAT_ID"),
            timeout_secs: env_parse("TELEGRAM_TIMEOUT_SECS", 15),
            max_attempts: env_parse("TELEGRAM_MAX_ATTEMPTS", 3),
        };

        let dashboard_auth = DashboardAuth {
            username: env::var("DASH_USER").unwrap_or_else(|_| "admin".to_string()),
            password: env::var("DASH_PASS").unwrap_or_else(|_| "admin".to_string()),
        };

        let defaults = ScraperConfig::default();
        let scraper = ScraperConfig {
            delay_ms: env_parse("SCRAPER_DELAY_MS", defaults.delay_ms),
            delay_variance_ms: env_parse("SCRAPER_DELAY_VARIANCE_MS", defaults.delay_variance_ms),
            min_delay_ms: env_parse("SCRAPER_MIN_DELAY_MS", defaults.min_delay_ms),
            timeout_secs: env_parse("SCRAPER_TIMEOUT_SECS", defaults.timeout_secs),
            connect_timeout_secs: env_parse(
                "SCRAPER_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            ),
            max_retries: env_parse("SCRAPER_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_parse("SCRAPER_RETRY_DELAY_MS", defaults.retry_delay_ms),
            backoff_factor: env_parse("SCRAPER_BACKOFF_FACTOR", defaults.backoff_factor),
            failure_threshold: env_parse("SCRAPER_FAILURE_THRESHOLD", defaults.failure_threshold),
            recovery_timeout_secs: env_parse(
                "SCRAPER_RECOVERY_TIMEOUT_SECS",
                defaults.recovery_timeout_secs,
            ),
            min_content_length: env_parse(
                "SCRAPER_MIN_CONTENT_LENGTH",
                defaults.min_content_length,
            ),
        };

        let scheduler_defaults = SchedulerConfig::default();
        let scheduler = SchedulerConfig {
            enabled: env::var("SCHEDULER_ENABLED")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
            alert_style: match env_nonempty("ALERT_STYLE") {
                Some(v) => v.parse().map_err(anyhow::Error::msg)?,
                None => AlertStyle::Standard,
            },
            smoke_url: env_nonempty("SMOKE_URL").unwrap_or(scheduler_defaults.smoke_url.clone()),
            ..scheduler_defaults
        };

        // Validate configuration
        if scraper.backoff_factor < 1.0 {
            anyhow::bail!("SCRAPER_BACKOFF_FACTOR must be >= 1.0");
        }
        if scraper.delay_variance_ms > scraper.delay_ms {
            anyhow::bail!("SCRAPER_DELAY_VARIANCE_MS cannot exceed SCRAPER_DELAY_MS");
        }
        if dashboard_auth.username.is_empty() || dashboard_auth.password.is_empty() {
            anyhow::bail!("DASH_USER and DASH_PASS cannot be empty");
        }

        Ok(Self {
            database_path,
            api_host,
            api_port,
            allowed_origins,
            api_base_url,
            telegram,
            dashboard_auth,
            scraper,
            scheduler,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "betdesk.db".to_string(),
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            allowed_origins: default_origins(),
            api_base_url: "http://localhost:8000".to_string(),
            telegram: TelegramConfig {
                timeout_secs: 15,
                max_attempts: 3,
                ..Default::default()
            },
            dashboard_auth: DashboardAuth::default(),
            scraper: ScraperConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// Flashscore site layout
pub struct Flashscore;

impl Flashscore {
    pub const BASE_URL: &'static str = "https://www.flashscore.com";

    pub fn sport_url(sport: &str) -> String {
        format!("{}/{}/", Self::BASE_URL, sport)
    }
}
