//! Server-rendered alert table behind basic auth

use super::{database_error, ApiError};
use crate::api::server::AppState;
use crate::formatters::fmt_line;
use crate::types::AlertRecord;
use axum::{extract::State, response::Html};
use chrono_tz::America::Bogota;

const PAGE_LIMIT: i64 = 200;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn start_local(alert: &AlertRecord) -> String {
    alert
        .start_time_utc
        .map(|dt| dt.with_timezone(&Bogota).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn row_html(alert: &AlertRecord) -> String {
    let score = if alert.is_ev() {
        format!("EV+ {:.1}%", alert.score * 100.0)
    } else {
        format!("Z {:.2}", alert.score)
    };
    let status = if alert.is_sent() { "Enviada" } else { "Pendiente" };

    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{} {}</td><td>{:.2}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        start_local(alert),
        escape(&alert.sport),
        escape(&alert.league),
        escape(&alert.event),
        escape(&alert.market),
        escape(format!("{} {}", alert.selection, fmt_line(alert.line)).trim()),
        alert.odds,
        escape(&alert.bookmaker),
        escape(&alert.reason),
        score,
        status
    )
}

/// Full HTML document for a list of alerts
pub fn render_alerts_page(alerts: &[AlertRecord]) -> String {
    let body = if alerts.is_empty() {
        "<tr><td colspan=\"10\">No hay alertas disponibles</td></tr>".to_string()
    } else {
        alerts.iter().map(row_html).collect::<Vec<_>>().join("\n")
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<title>BetDesk - Alertas</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; background: #111; color: #eee; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ padding: .4rem .6rem; border-bottom: 1px solid #333; text-align: left; }}
th {{ color: #aaa; }}
</style>
</head>
<body>
<h1>BetDesk</h1>
<p>{count} alertas (hora Bogotá)</p>
<table>
<thead><tr><th>Inicio</th><th>Deporte</th><th>Liga</th><th>Evento</th><th>Mercado</th><th>Cuota</th><th>Bookmaker</th><th>Motivo</th><th>Score</th><th>Estado</th></tr></thead>
<tbody>
{body}
</tbody>
</table>
</body>
</html>"#,
        count = alerts.len(),
        body = body
    )
}

/// `GET /` and `GET /alerts`
pub async fn alerts_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let alerts = state
        .db
        .get_latest_alerts(PAGE_LIMIT, None, None)
        .await
        .map_err(database_error)?;
    Ok(Html(render_alerts_page(&alerts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn alert() -> AlertRecord {
        AlertRecord {
            id: 1,
            sport: "football".to_string(),
            league: "Premier League".to_string(),
            event: "Arsenal vs <Spurs>".to_string(),
            start_time_utc: Some(Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap()),
            market: "TOTAL".to_string(),
            line: Some(2.5),
            selection: "OVER".to_string(),
            bookmaker: "Bet365".to_string(),
            odds: 2.05,
            reason: "EV".to_string(),
            score: 0.061,
            message: None,
            created_at_utc: Utc::now(),
            sent_at_utc: None,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn test_row_in_bogota_time() {
        let html = render_alerts_page(&[alert()]);
        assert!(html.contains("2025-03-01 15:00"));
        assert!(html.contains("Arsenal vs &lt;Spurs&gt;"));
        assert!(html.contains("EV+ 6.1%"));
        assert!(html.contains("OVER 2.5"));
        assert!(html.contains("Pendiente"));
    }

    #[test]
    fn test_empty_page() {
        assert!(render_alerts_page(&[]).contains("No hay alertas disponibles"));
    }
}
