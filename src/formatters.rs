//! Telegram HTML message layouts for anomaly and EV alerts

use crate::config::AlertStyle;
use crate::decision::classifier::Classification;
use crate::decision::ev::{EvModel, EvResult};
use crate::decision::quality::QualityReport;
use crate::types::{OddsRow, Sport};
use chrono::{DateTime, Utc};
use chrono_tz::America::Bogota;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━";

/// Kickoff in Bogota time as `DD/MM HH:MM`, empty when unknown
pub fn format_start_time(start: Option<DateTime<Utc>>) -> String {
    start
        .map(|dt| dt.with_timezone(&Bogota).format("%d/%m %H:%M").to_string())
        .unwrap_or_default()
}

/// Shortest float form that keeps a decimal point: 1.9, 2.0, 220.5
pub fn fmt_odds(value: f64) -> String {
    format!("{:?}", value)
}

pub fn fmt_line(line: Option<f64>) -> String {
    line.map(fmt_odds).unwrap_or_default()
}

fn signed_line(line: Option<f64>) -> String {
    format!("{:+.1}", line.unwrap_or(0.0))
}

fn handicap_text(row: &OddsRow, home: &str, away: &str) -> String {
    if row.selection == "HOME" {
        format!("{} ({})", home, signed_line(row.line))
    } else {
        format!("{} ({})", away, signed_line(row.line.map(|l| -l)))
    }
}

fn over_under_text(row: &OddsRow) -> String {
    if row.selection == "OVER" {
        format!("Over {}", fmt_line(row.line))
    } else {
        format!("Under {}", fmt_line(row.line))
    }
}

fn participants(row: &OddsRow, sport: Sport) -> (String, String) {
    let or = |name: &str, fallback: &str| {
        if name.is_empty() {
            fallback.to_string()
        } else {
            name.to_string()
        }
    };
    match sport {
        Sport::Tennis => (or(&row.home, "Player 1"), or(&row.away, "Player 2")),
        _ => (row.home.clone(), row.away.clone()),
    }
}

/// Human-readable pick for the market and selection
pub fn selection_text(row: &OddsRow, sport: Sport) -> String {
    let (home, away) = participants(row, sport);
    match sport {
        Sport::Football => match row.selection.as_str() {
            "HOME" => format!("🏠 {}", home),
            "AWAY" => format!("✈️ {}", away),
            "DRAW" => "🤝 Empate".to_string(),
            "OVER" | "UNDER" => over_under_text(row),
            "YES" => "Sí".to_string(),
            "NO" => "No".to_string(),
            other => other.to_string(),
        },
        Sport::Tennis | Sport::Basketball => match row.market.as_str() {
            "MONEYLINE" => {
                if row.selection == "HOME" {
                    format!("🏆 {}", home)
                } else {
                    format!("🏆 {}", away)
                }
            }
            "TOTAL" | "TOTAL_GAMES" => over_under_text(row),
            "SPREAD" | "HANDICAP_SETS" => handicap_text(row, &home, &away),
            _ => row.selection.clone(),
        },
    }
}

fn market_emoji(sport: Sport, market: &str, fallback: &'static str) -> &'static str {
    match (sport, market) {
        (Sport::Football, "1X2") => "⚽",
        (Sport::Football, "TOTAL") => "🎯",
        (Sport::Football, "BTTS") => "🔥",
        (Sport::Football, "SPREAD") => "📊",
        (Sport::Tennis, "MONEYLINE") => "🎾",
        (Sport::Tennis, "TOTAL_GAMES") => "🎯",
        (Sport::Tennis, "HANDICAP_SETS") => "📊",
        (Sport::Basketball, "TOTAL") => "🎯",
        (Sport::Basketball, "SPREAD") => "📊",
        (Sport::Basketball, "MONEYLINE") => "🏀",
        _ => fallback,
    }
}

fn standard_body(row: &OddsRow, sport: Sport, header: String) -> String {
    let (home, away) = participants(row, sport);
    let time = format_start_time(row.start_time_utc);
    let time_line = if time.is_empty() {
        String::new()
    } else {
        format!("🕐 {}\n", time)
    };

    format!(
        "{header}\n🏆 {league}\n{icon} {home} vs {away}\n{time_line}📊 Mercado: {market}\n🎲 {pick} @ <b>{odds}</b>\n🏪 {bookmaker}\n",
        header = header,
        league = row.league,
        icon = sport.emoji(),
        home = home,
        away = away,
        time_line = time_line,
        market = row.market,
        pick = selection_text(row, sport),
        odds = fmt_odds(row.odds),
        bookmaker = row.bookmaker,
    )
}

/// Anomaly alert in the per-sport layout
pub fn format_anomaly_standard(row: &OddsRow, sport: Sport, z: f64) -> String {
    let header = format!(
        "{} <b>ANOMALÍA - {}</b>",
        market_emoji(sport, &row.market, "📈"),
        sport.label_es()
    );
    let mut msg = standard_body(row, sport, header);
    msg.push_str(&format!("📈 Z-score: <b>{:.2}</b>\n", z.abs()));
    msg
}

/// EV alert in the per-sport layout
pub fn format_ev_standard(row: &OddsRow, sport: Sport, ev: f64, prob: Option<f64>) -> String {
    let header = format!(
        "{} <b>EV+ {}</b>",
        market_emoji(sport, &row.market, "💰"),
        sport.label_es()
    );
    let mut msg = standard_body(row, sport, header);
    msg.push_str(&format!("💰 EV: <b>{:.1}%</b>\n", ev * 100.0));
    if let Some(p) = prob.filter(|p| *p > 0.0) {
        msg.push_str(&format!("📊 Prob: {:.1}%\n", p * 100.0));
    }
    msg
}

fn improved_head(row: &OddsRow, sport: Sport, title: &str) -> String {
    let (home, away) = participants(row, sport);
    format!(
        "{title}\n{RULE}\n{icon} <b>{league}</b>\n⚔️ {home} vs {away}\n{RULE}\n📊 <b>Mercado:</b> {market}\n🎯 <b>Apuesta:</b> {pick}\n💰 <b>Cuota:</b> {odds}\n🏪 <b>Casa:</b> {bookmaker}\n",
        title = title,
        RULE = RULE,
        icon = sport.emoji(),
        league = row.league,
        home = home,
        away = away,
        market = row.market,
        pick = selection_text(row, sport),
        odds = fmt_odds(row.odds),
        bookmaker = row.bookmaker,
    )
}

/// Anomaly alert in the boxed layout
pub fn format_anomaly_improved(row: &OddsRow, sport: Sport, z: f64) -> String {
    let mut msg = improved_head(row, sport, "🚨 <b>ANOMALÍA DETECTADA</b> 🚨");
    msg.push_str(&format!("📈 <b>Z-score:</b> {:.2}\n", z.abs()));
    msg.push_str(RULE);
    msg.push_str("\n⚡ <i>Cuota significativamente diferente</i>");
    msg
}

/// EV alert in the boxed layout
pub fn format_ev_improved(row: &OddsRow, sport: Sport, ev: f64, prob: Option<f64>) -> String {
    let mut msg = improved_head(row, sport, "💎 <b>VALOR ESPERADO POSITIVO</b> 💎");
    msg.push_str(RULE);
    msg.push_str(&format!("\n📈 <b>EV:</b> {:.1}%\n", ev * 100.0));
    if let Some(p) = prob.filter(|p| *p > 0.0) {
        msg.push_str(&format!("🎲 <b>Probabilidad:</b> {:.1}%\n", p * 100.0));
    }
    msg.push_str(RULE);
    msg.push_str("\n✨ <i>Oportunidad de valor matemático</i>");
    msg
}

pub fn format_anomaly_alert(style: AlertStyle, row: &OddsRow, sport: Sport, z: f64) -> String {
    match style {
        AlertStyle::Standard => format_anomaly_standard(row, sport, z),
        AlertStyle::Improved => format_anomaly_improved(row, sport, z),
    }
}

pub fn format_ev_alert(
    style: AlertStyle,
    row: &OddsRow,
    sport: Sport,
    ev: f64,
    prob: Option<f64>,
) -> String {
    match style {
        AlertStyle::Standard => format_ev_standard(row, sport, ev, prob),
        AlertStyle::Improved => format_ev_improved(row, sport, ev, prob),
    }
}

/// Full basketball EV alert with classification, quality and model sections
pub fn format_basketball_pick(
    row: &OddsRow,
    result: &EvResult,
    quality: &QualityReport,
    classification: &Classification,
) -> String {
    let calc = &result.calc;
    let pick = match row.market.as_str() {
        "TOTAL" => format!("{} {}", row.selection, fmt_line(row.line)),
        "SPREAD" => handicap_text(row, &row.home, &row.away),
        _ => row.selection.clone(),
    };

    let mut msg = format!(
        "{emoji} <b>{description}</b>
🏀 {league}: {home} vs {away}

💰 <b>APUESTA:</b>
• {market} {pick}
• Cuota: {odds} @ {bookmaker}
• Cuota desvigada: {devigged:.2}
• EV: <b>+{ev_pct:.1}%</b>
• Kelly: {kelly:.0}%

⭐ <b>CLASIFICACIÓN:</b>
• Tipo: {pick_type}
• Confianza: {confidence:.0}%
• Acción: {action}

✅ <b>CALIDAD:</b>
• Score: {quality:.0}%
• Liquidez: {books} bookmakers
• Recomendación: {recommendation}

📊 <b>MODELO:</b>
• Prob. modelo: {model_prob:.1}%
• Prob. implícita: {implied:.1}%
• Edge: {edge:.1}%",
        emoji = classification.emoji,
        description = classification.description,
        league = row.league,
        home = row.home,
        away = row.away,
        market = row.market,
        pick = pick,
        odds = fmt_odds(row.odds),
        bookmaker = row.bookmaker,
        devigged = calc.devigged_odd,
        ev_pct = calc.ev_pct,
        kelly = classification.kelly_fraction * 100.0,
        pick_type = classification.type_label(),
        confidence = classification.confidence * 100.0,
        action = classification.action.as_str(),
        quality = quality.quality_score * 100.0,
        books = quality.liquidity.bookmaker_count,
        recommendation = quality.recommendation.as_str(),
        model_prob = calc.model_prob * 100.0,
        implied = calc.implied_prob * 100.0,
        edge = calc.edge * 100.0,
    );

    if let EvModel::NormalDistribution {
        total_mean,
        total_std,
        ..
    } = &result.model
    {
        msg.push_str(&format!(
            "\n• Total esperado: {:.1} ± {:.1}",
            total_mean, total_std
        ));
    }
    msg
}
