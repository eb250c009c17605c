//! Model-priced EV scan for football and tennis

use super::{snapshot_window, JobContext, ScanSummary};
use crate::decision::math::expected_value;
use crate::decision::{football, tennis};
use crate::formatters::format_ev_alert;
use crate::sports::{ev_threshold, league_params};
use crate::types::{OddsRow, Sport};
use anyhow::Result;
use tracing::{debug, info};

/// Model probability for a row, None when the sport has no baseline model
/// or the probability is degenerate
pub fn model_probability(sport: Sport, row: &OddsRow) -> Option<f64> {
    let p = match sport {
        Sport::Football => football::model_probability(row),
        Sport::Tennis => tennis::model_probability(row),
        Sport::Basketball => None,
    }?;
    (p > 0.0 && p < 1.0).then_some(p)
}

pub async fn run_model_ev(ctx: &JobContext, sport: Sport) -> Result<ScanSummary> {
    let rows = ctx
        .db
        .fetch_latest_odds_snapshot(snapshot_window(sport), Some(sport.as_str()))
        .await?;
    let mut summary = ScanSummary {
        rows: rows.len(),
        ..Default::default()
    };

    for row in &rows {
        if league_params(sport, &row.league).is_err() {
            debug!("No parameters for {} league {}", sport, row.league);
            continue;
        }
        let Some(p) = model_probability(sport, row) else {
            continue;
        };

        let ev = expected_value(p, row.odds);
        if ev < ev_threshold(sport, &row.league, &row.market) {
            continue;
        }
        summary.candidates += 1;

        let alert_id = ctx.db.create_alert_ev(row, ev).await?;
        ctx.metrics.record_alert(alert_id != 0);
        if alert_id == 0 {
            continue;
        }
        summary.alerts += 1;

        let message = format_ev_alert(ctx.config.scheduler.alert_style, row, sport, ev, Some(p));
        if ctx.deliver(alert_id, &message).await? {
            summary.delivered += 1;
        }
    }

    info!(
        "{} EV scan OK. rows={} picks={} alerts={}",
        sport, summary.rows, summary.candidates, summary.alerts
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::test_support::{context, quote, seed_event};

    #[tokio::test]
    async fn test_football_value_price_alerts_once() {
        let ctx = context().await;
        seed_event(
            &ctx,
            Sport::Football,
            "Premier League",
            "https://x/match/ev1/",
            &[
                quote("1X2", None, "Bet365", "HOME", 4.0),
                quote("1X2", None, "Bet365", "AWAY", 1.5),
            ],
        )
        .await;

        let first = run_model_ev(&ctx, Sport::Football).await.unwrap();
        assert_eq!(first.rows, 2);
        assert_eq!(first.candidates, 1);
        assert_eq!(first.alerts, 1);

        let second = run_model_ev(&ctx, Sport::Football).await.unwrap();
        assert_eq!(second.candidates, 1);
        assert_eq!(second.alerts, 0);
    }

    #[tokio::test]
    async fn test_unconfigured_league_skipped() {
        let ctx = context().await;
        seed_event(
            &ctx,
            Sport::Football,
            "Sunday League",
            "https://x/match/ev2/",
            &[quote("1X2", None, "Bet365", "HOME", 10.0)],
        )
        .await;

        let summary = run_model_ev(&ctx, Sport::Football).await.unwrap();
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.candidates, 0);
    }

    #[tokio::test]
    async fn test_tennis_moneyline_underdog_price() {
        let ctx = context().await;
        seed_event(
            &ctx,
            Sport::Tennis,
            "ATP",
            "https://x/match/ev3/",
            &[quote("MONEYLINE", None, "Bet365", "HOME", 2.5)],
        )
        .await;

        let summary = run_model_ev(&ctx, Sport::Tennis).await.unwrap();
        assert_eq!(summary.alerts, 1);
    }
}
