//! Z-score anomaly scan over the latest odds snapshot

use super::{snapshot_window, JobContext, ScanSummary};
use crate::decision::detect_anomalies;
use crate::formatters::format_anomaly_alert;
use crate::sports::anomaly_threshold;
use crate::types::Sport;
use anyhow::Result;
use tracing::info;

/// Bookmakers a market group needs before prices are scored
pub fn anomaly_min_books(sport: Sport) -> usize {
    match sport {
        Sport::Basketball => 2,
        Sport::Football | Sport::Tennis => 3,
    }
}

pub async fn run_anomalies(ctx: &JobContext, sport: Sport) -> Result<ScanSummary> {
    let rows = ctx
        .db
        .fetch_latest_odds_snapshot(snapshot_window(sport), Some(sport.as_str()))
        .await?;
    let hits = detect_anomalies(&rows, anomaly_threshold(sport), anomaly_min_books(sport));

    let mut summary = ScanSummary {
        rows: rows.len(),
        candidates: hits.len(),
        ..Default::default()
    };
    info!(
        "{} anomalies scan OK. rows={} hits={}",
        sport,
        summary.rows,
        summary.candidates
    );

    for hit in &hits {
        let alert_id = ctx.db.create_alert_from_anomaly(&hit.row, hit.z.abs()).await?;
        ctx.metrics.record_alert(alert_id != 0);
        if alert_id == 0 {
            continue;
        }
        summary.alerts += 1;

        let message = format_anomaly_alert(ctx.config.scheduler.alert_style, &hit.row, sport, hit.z);
        if ctx.deliver(alert_id, &message).await? {
            summary.delivered += 1;
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::AlertQuery;
    use crate::jobs::test_support::{context, quote, seed_event};
    use crate::types::AlertReason;

    #[tokio::test]
    async fn test_outlier_raises_single_alert() {
        let ctx = context().await;
        seed_event(
            &ctx,
            Sport::Basketball,
            "NBA",
            "https://x/match/anom1/",
            &[
                quote("TOTAL", Some(220.5), "Bet365", "OVER", 1.90),
                quote("TOTAL", Some(220.5), "Pinnacle", "OVER", 1.91),
                quote("TOTAL", Some(220.5), "Betway", "OVER", 1.89),
                quote("TOTAL", Some(220.5), "Unibet", "OVER", 2.60),
            ],
        )
        .await;

        let first = run_anomalies(&ctx, Sport::Basketball).await.unwrap();
        assert_eq!(first.rows, 4);
        assert!(first.alerts >= 1);
        assert_eq!(first.delivered, 0);

        let alerts = ctx
            .db
            .query_alerts(&AlertQuery {
                reason: Some(AlertReason::Anomaly),
                limit: 50,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(alerts.iter().any(|a| a.bookmaker == "Unibet"));
        assert!(alerts.iter().all(|a| a.message.is_some()));

        // same snapshot again: everything deduplicated
        let second = run_anomalies(&ctx, Sport::Basketball).await.unwrap();
        assert_eq!(second.candidates, first.candidates);
        assert_eq!(second.alerts, 0);
    }

    #[tokio::test]
    async fn test_football_needs_three_books() {
        let ctx = context().await;
        seed_event(
            &ctx,
            Sport::Football,
            "Premier League",
            "https://x/match/anom2/",
            &[
                quote("1X2", None, "Bet365", "HOME", 2.0),
                quote("1X2", None, "Unibet", "HOME", 3.5),
            ],
        )
        .await;

        let summary = run_anomalies(&ctx, Sport::Football).await.unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.candidates, 0);
    }
}
