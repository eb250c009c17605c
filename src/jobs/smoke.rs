//! Hourly reachability check against a Flashscore page

use super::JobContext;
use crate::ingest::html::is_valid_html;
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Fetch the configured page and return its length
pub async fn run_smoke(ctx: &JobContext) -> Result<usize> {
    let url = &ctx.config.scheduler.smoke_url;
    let html = ctx
        .provider
        .fetcher()
        .fetch_page(url)
        .await
        .with_context(|| format!("Flashscore smoke failed for {}", url))?;

    if is_valid_html(&html, ctx.config.scraper.min_content_length) {
        info!("Flashscore smoke OK. html_len={}", html.len());
    } else {
        warn!("Flashscore smoke returned suspicious HTML. html_len={}", html.len());
    }
    Ok(html.len())
}
