//! Discover upcoming events and store their current odds

use super::JobContext;
use crate::ingest::errors::{validate_event, validate_quote};
use crate::ingest::ScraperError;
use crate::types::{OddsQuote, Sport};
use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub events: usize,
    pub odds: usize,
    pub skipped: usize,
}

/// Drop quotes that fail validation, logging each one
pub fn valid_quotes(quotes: Vec<OddsQuote>) -> (Vec<OddsQuote>, usize) {
    let total = quotes.len();
    let kept: Vec<OddsQuote> = quotes
        .into_iter()
        .filter(|q| match validate_quote(q) {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropping quote: {}", e);
                false
            }
        })
        .collect();
    let dropped = total - kept.len();
    (kept, dropped)
}

pub async fn run_ingest(ctx: &JobContext, sport: Sport) -> Result<IngestSummary> {
    let events = ctx.discovery.discover(sport).await;
    let mut summary = IngestSummary::default();

    for event in &events {
        if let Err(e) = validate_event(event) {
            warn!("Skipping event: {}", e);
            summary.skipped += 1;
            continue;
        }

        let event_id = ctx.db.upsert_event(event).await?;
        summary.events += 1;

        let quotes = match ctx.provider.odds_for_sport_event(sport, &event.url).await {
            Ok(quotes) => quotes,
            Err(ScraperError::CircuitOpen) => {
                warn!("Circuit open, stopping {} ingest", sport);
                break;
            }
            Err(e) => {
                error!("Odds fetch failed for {}: {}", event.url, e);
                continue;
            }
        };

        let (quotes, dropped) = valid_quotes(quotes);
        summary.skipped += dropped;
        summary.odds += ctx.db.insert_odds(event_id, &quotes, Utc::now()).await?;
    }

    ctx.metrics.add_events_ingested(summary.events as u64);
    ctx.metrics.add_odds_ingested(summary.odds as u64);

    info!(
        "✅ {} ingest OK. events={} odds={} skipped={}",
        sport, summary.events, summary.odds, summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::test_support::quote;

    #[test]
    fn test_valid_quotes_drops_bad_prices() {
        let (kept, dropped) = valid_quotes(vec![
            quote("TOTAL", Some(220.5), "Bet365", "OVER", 1.91),
            quote("TOTAL", Some(220.5), "Bet365", "UNDER", 1.0),
            quote("TOTAL", Some(220.5), "", "OVER", 1.9),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 2);
        assert_eq!(kept[0].selection, "OVER");
    }
}
