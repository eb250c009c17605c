//! Basketball EV pipeline: pricing errors first, then devigged EV picks that
//! clear the quality filter and the classifier.

use super::{snapshot_window, JobContext, ScanSummary};
use crate::decision::anomaly::pick_z_score;
use crate::decision::ev::{spread_ev, total_ev};
use crate::decision::{
    apply_all_filters, classify_pick, scan_all_odds, should_bet, EvResult, PickSignals,
};
use crate::formatters::format_basketball_pick;
use crate::types::{OddsPoint, OddsRow, Sport};
use anyhow::Result;
use std::collections::HashMap;
use tracing::{debug, info, warn};

const MODEL_LEAGUES: [&str; 2] = ["NBA", "CBA"];
const MIN_EV: f64 = 0.03;
const MIN_EDGE: f64 = 0.02;
const MIN_PROB: f64 = 0.45;
const MIN_QUALITY: f64 = 0.70;
const MODEL_CONFIDENCE: f64 = 0.75;
const Z_MIN_BOOKS: usize = 2;

type PickKey = (i64, String, Option<u64>, String, String);

fn pick_key(row: &OddsRow) -> PickKey {
    (
        row.event_id,
        row.market.clone(),
        row.line.map(f64::to_bits),
        row.selection.clone(),
        row.bookmaker.clone(),
    )
}

fn error_key(row: &OddsRow) -> String {
    format!(
        "{}|{}|{:?}|{}|{}",
        row.event_id, row.market, row.line, row.selection, row.bookmaker
    )
}

/// Rows the matchup model can price
pub fn is_model_row(row: &OddsRow) -> bool {
    MODEL_LEAGUES.contains(&row.league.as_str())
        && matches!(row.market.as_str(), "TOTAL" | "SPREAD")
        && row.line.is_some()
}

async fn load_histories(ctx: &JobContext, rows: &[OddsRow]) -> Result<HashMap<PickKey, Vec<OddsPoint>>> {
    let mut histories = HashMap::with_capacity(rows.len());
    for row in rows {
        let history = ctx
            .db
            .odds_history(
                row.event_id,
                &row.market,
                row.line,
                &row.selection,
                &row.bookmaker,
                snapshot_window(Sport::Basketball),
            )
            .await?;
        histories.insert(pick_key(row), history);
    }
    Ok(histories)
}

async fn price_row(ctx: &JobContext, row: &OddsRow, line: f64, snapshot: &[OddsRow]) -> Option<EvResult> {
    match row.market.as_str() {
        "TOTAL" => {
            let (mean, std) = ctx.stats.matchup_total(&row.home, &row.away, &row.league).await;
            Some(total_ev(mean, std, line, row, snapshot, true))
        }
        "SPREAD" => {
            let spread = ctx
                .stats
                .matchup_spread(&row.home, &row.away, &row.league, line)
                .await;
            Some(spread_ev(&spread, line, row, snapshot, true))
        }
        _ => None,
    }
}

/// Report actionable pricing errors, each pick once per process
async fn report_pricing_errors(
    ctx: &JobContext,
    rows: &[OddsRow],
    histories: &HashMap<PickKey, Vec<OddsPoint>>,
) -> usize {
    let hits = scan_all_odds(rows, |row| {
        histories.get(&pick_key(row)).cloned().unwrap_or_default()
    });

    for hit in hits.iter().filter(|h| h.detection.is_actionable()) {
        let key = error_key(&hit.row);
        if !ctx.claim_error(key.clone()).await {
            continue;
        }
        warn!(
            "🚨 ERROR DE CUOTA detectado: {} {} {} @ {}",
            hit.row.event_label(),
            hit.row.market,
            hit.row.selection,
            hit.row.bookmaker
        );

        if let Some(telegram) = &ctx.telegram {
            let sent = telegram.maybe_send_error_cuota(&hit.row, &hit.detection).await;
            ctx.metrics.record_telegram(sent);
            if !sent {
                ctx.release_error(&key).await;
            }
        }
    }
    hits.len()
}

pub async fn run_basketball_ev(ctx: &JobContext) -> Result<ScanSummary> {
    let rows = ctx
        .db
        .fetch_latest_odds_snapshot(snapshot_window(Sport::Basketball), Some("basketball"))
        .await?;
    if rows.is_empty() {
        info!("Basketball EV: No odds found");
        return Ok(ScanSummary::default());
    }

    let histories = load_histories(ctx, &rows).await?;
    let mut summary = ScanSummary {
        rows: rows.len(),
        pricing_errors: report_pricing_errors(ctx, &rows, &histories).await,
        ..Default::default()
    };
    let mut processed = 0usize;

    for row in rows.iter().filter(|r| is_model_row(r)) {
        let Some(line) = row.line else { continue };
        processed += 1;

        let Some(result) = price_row(ctx, row, line, &rows).await else {
            continue;
        };

        let (bet, reason) = should_bet(&result.calc, MIN_EV, MIN_EDGE, MIN_PROB);
        if !bet {
            debug!("{} {}: {}", row.event_label(), row.selection, reason);
            continue;
        }

        let history = histories.get(&pick_key(row)).map(Vec::as_slice).unwrap_or(&[]);
        let quality = apply_all_filters(row, &rows, history, MIN_QUALITY);
        if !quality.passed {
            debug!("Pick rejected by quality filters: {}", row.event_label());
            continue;
        }

        let classification = classify_pick(&PickSignals {
            ev: Some(result.calc.ev),
            z_score: pick_z_score(row, &rows, Z_MIN_BOOKS),
            quality_score: quality.quality_score,
            model_confidence: MODEL_CONFIDENCE,
            ..Default::default()
        });
        if !classification.action.is_bet() {
            continue;
        }
        summary.candidates += 1;

        let alert_id = ctx.db.create_alert_ev(row, result.calc.ev).await?;
        ctx.metrics.record_alert(alert_id != 0);
        if alert_id == 0 {
            continue;
        }
        summary.alerts += 1;

        let message = format_basketball_pick(row, &result, &quality, &classification);
        if ctx.deliver(alert_id, &message).await? {
            summary.delivered += 1;
        }

        info!(
            "✅ Basketball EV alert: {} | EV={:.1}% | Quality={:.0}% | Type={}",
            row.event_label(),
            result.calc.ev * 100.0,
            quality.quality_score * 100.0,
            classification.type_label()
        );
    }

    info!(
        "Basketball EV scan OK. rows={} processed={} alerts={} errors={}",
        summary.rows, processed, summary.alerts, summary.pricing_errors
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelegramConfig;
    use crate::decision::test_row;
    use crate::jobs::test_support::{context, quote, seed_event};
    use crate::telegram::TelegramNotifier;
    use crate::types::{GameResult, OddsQuote};
    use axum::{extract::State, http::StatusCode, routing::post, Router};
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    const BOOKS: [&str; 6] = ["Pinnacle", "Bet365", "Betfair", "Bwin", "1xBet", "Betsson"];

    /// Six recent games per team: 120/130 points scored, 115 allowed
    async fn seed_results(ctx: &JobContext) {
        for i in 0..6i64 {
            let scored = if i % 2 == 0 { 120 } else { 130 };
            let game_date = Utc::now() - Duration::days(i + 1);
            ctx.db
                .record_game_result(&GameResult {
                    sport: "basketball".to_string(),
                    league: "NBA".to_string(),
                    home_team: "Home FC".to_string(),
                    away_team: format!("Opp{}", i),
                    home_score: scored,
                    away_score: 115,
                    game_date,
                })
                .await
                .unwrap();
            ctx.db
                .record_game_result(&GameResult {
                    sport: "basketball".to_string(),
                    league: "NBA".to_string(),
                    home_team: format!("Rival{}", i),
                    away_team: "Away FC".to_string(),
                    home_score: 115,
                    away_score: scored,
                    game_date,
                })
                .await
                .unwrap();
        }
    }

    /// Bot API stub that fails the first call with a 500 and accepts the rest
    async fn flaky_bot() -> (String, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));

        async fn handler(State(calls): State<Arc<AtomicU32>>) -> (StatusCode, &'static str) {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                (StatusCode::INTERNAL_SERVER_ERROR, "down")
            } else {
                (StatusCode::OK, "{}")
            }
        }

        let app = Router::new()
            .route("/bottok/sendMessage", post(handler))
            .with_state(calls.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), calls)
    }

    #[test]
    fn test_model_rows() {
        assert!(is_model_row(&test_row(1, "TOTAL", Some(220.5), "Bet365", "OVER", 1.9)));
        assert!(!is_model_row(&test_row(1, "TOTAL", None, "Bet365", "OVER", 1.9)));
        assert!(!is_model_row(&test_row(1, "MONEYLINE", None, "Bet365", "HOME", 1.9)));

        let mut euro = test_row(1, "SPREAD", Some(-4.5), "Bet365", "HOME", 1.9);
        euro.league = "Euroleague".to_string();
        assert!(!is_model_row(&euro));
    }

    #[test]
    fn test_pick_key_distinguishes_lines() {
        let a = test_row(1, "TOTAL", Some(220.5), "Bet365", "OVER", 1.9);
        let b = test_row(1, "TOTAL", Some(221.5), "Bet365", "OVER", 1.9);
        assert_ne!(pick_key(&a), pick_key(&b));
        assert_eq!(pick_key(&a), pick_key(&a.clone()));
    }

    #[tokio::test]
    async fn test_empty_snapshot() {
        let ctx = context().await;
        let summary = run_basketball_ev(&ctx).await.unwrap();
        assert_eq!(summary, ScanSummary::default());
    }

    #[tokio::test]
    async fn test_fair_market_raises_nothing() {
        let ctx = context().await;
        seed_event(
            &ctx,
            Sport::Basketball,
            "NBA",
            "https://x/match/bk1/",
            &[
                quote("TOTAL", Some(224.0), "Bet365", "OVER", 1.90),
                quote("TOTAL", Some(224.0), "Bet365", "UNDER", 1.90),
                quote("TOTAL", Some(224.0), "Pinnacle", "OVER", 1.90),
                quote("TOTAL", Some(224.0), "Pinnacle", "UNDER", 1.90),
            ],
        )
        .await;

        let summary = run_basketball_ev(&ctx).await.unwrap();
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.alerts, 0);
    }

    #[tokio::test]
    async fn test_value_pick_becomes_alert_once() {
        let ctx = context().await;
        seed_results(&ctx).await;

        // model total 242 ± 7.1 against a 230.5 line
        let quotes: Vec<OddsQuote> = BOOKS
            .iter()
            .flat_map(|b| {
                [
                    quote("TOTAL", Some(230.5), b, "OVER", 1.90),
                    quote("TOTAL", Some(230.5), b, "UNDER", 1.90),
                ]
            })
            .collect();
        let event_id = seed_event(&ctx, Sport::Basketball, "NBA", "https://x/match/bk2/", &quotes).await;
        ctx.db
            .insert_odds(event_id, &quotes, Utc::now() - Duration::minutes(10))
            .await
            .unwrap();

        let first = run_basketball_ev(&ctx).await.unwrap();
        assert_eq!(first.rows, 12);
        assert_eq!(first.pricing_errors, 0);
        assert_eq!(first.alerts, 6);
        assert_eq!(first.delivered, 0);

        let alerts = ctx.db.get_latest_alerts(50, Some("basketball"), None).await.unwrap();
        assert_eq!(alerts.len(), 6);
        assert!(alerts.iter().all(|a| a.selection == "OVER" && a.is_ev()));
        assert!(alerts.iter().all(|a| a.message.as_deref().unwrap_or("").contains("230.5")));

        let second = run_basketball_ev(&ctx).await.unwrap();
        assert_eq!(second.candidates, 6);
        assert_eq!(second.alerts, 0);
        assert_eq!(ctx.db.alert_stats().await.unwrap().total, 6);
    }

    #[tokio::test]
    async fn test_pricing_error_sent_once_after_failed_send() {
        let (base, calls) = flaky_bot().await;
        let telegram = TelegramNotifier::from_config(&TelegramConfig {
            bot_token: Some("tok".to_string()),
            chat_id: Some("1".to_string()),
            timeout_secs: 2,
            max_attempts: 1,
        })
        .map(|t| t.with_api_base(base));
        let ctx = context().await.with_telegram(telegram);

        seed_event(
            &ctx,
            Sport::Basketball,
            "NBA",
            "https://x/match/bk3/",
            &[
                quote("TOTAL", Some(230.5), "Bet365", "OVER", 1.90),
                quote("TOTAL", Some(230.5), "Pinnacle", "OVER", 1.92),
                quote("TOTAL", Some(230.5), "Bwin", "OVER", 1.88),
                quote("TOTAL", Some(230.5), "Betfair", "OVER", 1.91),
                quote("TOTAL", Some(230.5), "1xBet", "OVER", 3.50),
            ],
        )
        .await;

        let first = run_basketball_ev(&ctx).await.unwrap();
        assert_eq!(first.pricing_errors, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // the failed send released the pick, so it goes out on the next run
        run_basketball_ev(&ctx).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        run_basketball_ev(&ctx).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let metrics = ctx.metrics.snapshot().await;
        assert_eq!(metrics.telegram_sent, 1);
        assert_eq!(metrics.telegram_failed, 1);
        assert_eq!(ctx.db.alert_stats().await.unwrap().total, 0);
    }
}
