//! Terminal rendering of alerts and stat cards

use super::types::{ApiAlert, ApiAlertType, DashboardStats};
use crate::formatters::format_start_time;
use colored::Colorize;

pub fn sport_icon(sport: &str) -> &'static str {
    match sport.to_lowercase().as_str() {
        "basketball" => "🏀",
        "football" => "⚽",
        "tennis" => "🎾",
        _ => "🎯",
    }
}

/// `EV+ 5.4%` for EV alerts (value in percent), `Z-score 2.31` for anomalies
pub fn reason_badge(alert_type: ApiAlertType, value: f64) -> String {
    match alert_type {
        ApiAlertType::Ev => format!("EV+ {:.1}%", value),
        ApiAlertType::Anomalia => format!("Z-score {:.2}", value),
    }
}

pub fn status_badge(sent: bool) -> &'static str {
    if sent {
        "Enviada"
    } else {
        "Pendiente"
    }
}

impl DashboardStats {
    pub fn from_alerts(alerts: &[ApiAlert]) -> Self {
        let mut stats = DashboardStats {
            total: alerts.len(),
            ..Default::default()
        };
        for alert in alerts {
            match alert.alert_type {
                ApiAlertType::Ev => stats.ev_positive += 1,
                ApiAlertType::Anomalia => stats.anomalies += 1,
            }
            if alert.sent_at.is_some() {
                stats.sent += 1;
            }
        }
        stats
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn badge_for(alert: &ApiAlert) -> String {
    let value = match alert.alert_type {
        ApiAlertType::Ev => alert.ev,
        ApiAlertType::Anomalia => alert.score,
    };
    reason_badge(alert.alert_type, value)
}

/// Four stat cards on one line each
pub fn render_stat_cards(stats: &DashboardStats) -> String {
    [
        ("Total Alertas", stats.total, "Alertas generadas"),
        ("EV+", stats.ev_positive, "Valor esperado positivo"),
        ("Anomalías", stats.anomalies, "Desviaciones de mercado"),
        ("Enviadas", stats.sent, "Entregadas por Telegram"),
    ]
    .iter()
    .map(|(title, value, description)| {
        format!(
            "{} {}  {}",
            format!("{:<16}", title).bold(),
            format!("{:>6}", value).cyan().bold(),
            description.dimmed()
        )
    })
    .collect::<Vec<_>>()
    .join("\n")
}

/// Alert table, newest first as received
pub fn render_table(alerts: &[ApiAlert]) -> String {
    if alerts.is_empty() {
        return format!(
            "{}\n{}",
            "No hay alertas disponibles".yellow().bold(),
            "El sistema está monitoreando eventos.".dimmed()
        );
    }

    let mut out = vec![
        format!(
            "{:<3} {:<12} {:<28} {:<18} {:>6} {:<12} {:<16} {:<12} {:<9}",
            "", "Liga", "Evento", "Mercado", "Cuota", "Bookmaker", "Análisis", "Inicio", "Estado"
        ),
        "-".repeat(124),
    ];

    for alert in alerts {
        let market = match alert.line {
            Some(line) => format!("{} {} {}", alert.market, alert.selection, line),
            None => format!("{} {}", alert.market, alert.selection),
        };
        let badge = match alert.alert_type {
            ApiAlertType::Ev => format!("{:<16}", badge_for(alert)).green(),
            ApiAlertType::Anomalia => format!("{:<16}", badge_for(alert)).yellow(),
        };
        let status = if alert.sent_at.is_some() {
            status_badge(true).green()
        } else {
            status_badge(false).yellow()
        };
        let start = format!("{:<12}", format_start_time(alert.start_time));

        out.push(format!(
            "{:<3} {:<12} {:<28} {:<18} {:>6.2} {:<12} {} {} {}",
            sport_icon(&alert.sport),
            truncate(&alert.league, 12),
            truncate(&alert.match_name, 28),
            truncate(&market, 18),
            alert.odds,
            truncate(&alert.bookmaker, 12),
            badge,
            start,
            status
        ));
    }
    out.join("\n")
}
