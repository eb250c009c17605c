//! BetDesk Web Server
//!
//! JSON API for the dashboard plus the background ingestion and alert jobs.

use anyhow::Result;
use betdesk::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Override with RUST_LOG, e.g. RUST_LOG=betdesk=debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("betdesk=info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║       BETDESK - ODDS MONITOR                                 ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  Database: {:<49} ║", config.database_path);
    println!("║  Scheduler: {:<48} ║", if config.scheduler.enabled { "ENABLED" } else { "DISABLED" });
    println!("║  Telegram: {:<49} ║", if config.telegram.is_configured() { "ENABLED" } else { "DISABLED" });
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    betdesk::api::serve(config).await
}
