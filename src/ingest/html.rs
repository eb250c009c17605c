//! HTML helpers for Flashscore pages

use crate::ingest::errors::ScraperError;
use crate::types::Sport;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

pub fn selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::Parsing(format!("selector {}: {}", css, e)))
}

/// Event id from a Flashscore URL: the `mid` parameter, a `/match/<id>/` segment,
/// or an 8-character id suffix such as `team-AbCd1234/`
pub fn extract_event_id(url: &str) -> Option<String> {
    let patterns = [
        r"[?&]mid=([^/&#]+)",
        r"/match/([a-zA-Z0-9]+)/",
        r"-([a-zA-Z0-9]{8})/",
    ];
    patterns.iter().find_map(|p| {
        Regex::new(p)
            .ok()?
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    })
}

fn sport_from_text(text: &str) -> Option<Sport> {
    let text = text.to_lowercase();
    if text.contains("basketball") || text.contains("baloncesto") {
        Some(Sport::Basketball)
    } else if text.contains("football") || text.contains("futbol") || text.contains("soccer") {
        Some(Sport::Football)
    } else if text.contains("tennis") || text.contains("tenis") {
        Some(Sport::Tennis)
    } else {
        None
    }
}

/// Detect the sport from the URL path, then the breadcrumb, then `<meta name="sport">`
pub fn extract_sport_type(html: &str, url: Option<&str>) -> Option<Sport> {
    if let Some(url) = url {
        let lower = url.to_lowercase();
        let from_path = [
            ("/basketball/", Sport::Basketball),
            ("/baloncesto/", Sport::Basketball),
            ("/football/", Sport::Football),
            ("/futbol/", Sport::Football),
            ("/soccer/", Sport::Football),
            ("/tennis/", Sport::Tennis),
            ("/tenis/", Sport::Tennis),
        ]
        .iter()
        .find(|(segment, _)| lower.contains(segment))
        .map(|(_, sport)| *sport);
        if from_path.is_some() {
            return from_path;
        }
    }

    if html.is_empty() {
        return None;
    }
    let document = Html::parse_document(html);

    if let Ok(sel) = selector("[class*='breadcrumb']") {
        if let Some(crumb) = document.select(&sel).next() {
            let text: String = crumb.text().collect();
            if let Some(sport) = sport_from_text(&text) {
                return Some(sport);
            }
        }
    }

    let sel = selector("meta[name='sport']").ok()?;
    let meta = document.select(&sel).next()?;
    sport_from_text(meta.value().attr("content")?)
}

/// Long enough, looks like a document, and not a not-found page
pub fn is_valid_html(html: &str, min_length: usize) -> bool {
    if html.len() < min_length {
        return false;
    }
    let lower = html.to_lowercase();
    if !lower.contains("<html") && !lower.contains("<body") {
        return false;
    }
    !(lower.contains("error 404") || lower.contains("page not found"))
}

/// Collapse whitespace runs and trim
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse `HH:MM` (today, relative to `now`), `DD.MM.YYYY HH:MM`,
/// `YYYY-MM-DD HH:MM` or ISO 8601. All naive times are UTC.
pub fn parse_time_string(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if text.contains('T') || text.len() > 16 {
        return DateTime::parse_from_rfc3339(&text.replace('Z', "+00:00"))
            .ok()
            .map(|dt| dt.with_timezone(&Utc));
    }

    if let Some(caps) = Regex::new(r"^(\d{1,2}):(\d{2})$").ok()?.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        let naive = now.date_naive().and_hms_opt(hour, minute, 0)?;
        return Some(Utc.from_utc_datetime(&naive));
    }

    if let Some(caps) = Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{4})\s+(\d{1,2}):(\d{2})")
        .ok()?
        .captures(text)
    {
        let date = NaiveDate::from_ymd_opt(caps[3].parse().ok()?, caps[2].parse().ok()?, caps[1].parse().ok()?)?;
        let naive = date.and_hms_opt(caps[4].parse().ok()?, caps[5].parse().ok()?, 0)?;
        return Some(Utc.from_utc_datetime(&naive));
    }

    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Cleaned text of the first match under `element`
pub fn safe_select_text(element: &ElementRef<'_>, css: &str) -> Option<String> {
    let sel = selector(css).ok()?;
    let text = clean_text(&element.select(&sel).next()?.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

/// Attribute of the first match under `element`
pub fn safe_select_attr(element: &ElementRef<'_>, css: &str, attr: &str) -> Option<String> {
    let sel = selector(css).ok()?;
    element
        .select(&sel)
        .next()?
        .value()
        .attr(attr)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_extract_event_id() {
        assert_eq!(
            extract_event_id("https://www.flashscore.com/match/abc123/").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            extract_event_id("https://www.flashscore.com/match/basketball/lakers-AbCd1234/celtics-XyZw9876/?mid=Q1w2E3r4")
                .as_deref(),
            Some("Q1w2E3r4")
        );
        assert_eq!(extract_event_id("https://www.flashscore.com/"), None);
    }

    #[test]
    fn test_extract_sport_type() {
        assert_eq!(
            extract_sport_type("", Some("https://www.flashscore.co/futbol/espana/")),
            Some(Sport::Football)
        );
        let html = r#"<html><body><div class="breadcrumb">Tennis &gt; ATP</div></body></html>"#;
        assert_eq!(extract_sport_type(html, None), Some(Sport::Tennis));
        let meta = r#"<html><head><meta name="sport" content="Basketball"></head></html>"#;
        assert_eq!(extract_sport_type(meta, None), Some(Sport::Basketball));
        assert_eq!(extract_sport_type("<html></html>", None), None);
    }

    #[test]
    fn test_is_valid_html() {
        let page = format!("<html><body>{}</body></html>", "x".repeat(1000));
        assert!(is_valid_html(&page, 1000));
        assert!(!is_valid_html("<html></html>", 1000));
        assert!(!is_valid_html(&"x".repeat(2000), 1000));
        let missing = format!("<html>Page not found{}</html>", "x".repeat(1000));
        assert!(!is_valid_html(&missing, 1000));
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Los Angeles\n  Lakers \r\n"), "Los Angeles Lakers");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_parse_time_string() {
        let now = Utc.with_ymd_and_hms(2024, 1, 25, 12, 0, 0).unwrap();

        let t = parse_time_string("19:30", now).unwrap();
        assert_eq!((t.day(), t.hour(), t.minute()), (25, 19, 30));

        let t = parse_time_string("26.01.2024 01:15", now).unwrap();
        assert_eq!((t.month(), t.day(), t.hour()), (1, 26, 1));

        let t = parse_time_string("2024-02-01 20:00", now).unwrap();
        assert_eq!((t.month(), t.day()), (2, 1));

        let t = parse_time_string("2024-01-25T19:30:00Z", now).unwrap();
        assert_eq!(t.hour(), 19);

        assert!(parse_time_string("tomorrow", now).is_none());
        assert!(parse_time_string("25:99", now).is_none());
    }

    #[test]
    fn test_safe_select() {
        let doc = Html::parse_fragment(
            r#"<div class="row"><span class="name">  Bet365 </span><img alt="Pinnacle"></div>"#,
        );
        let root = doc.root_element();
        assert_eq!(safe_select_text(&root, "span.name").as_deref(), Some("Bet365"));
        assert_eq!(safe_select_attr(&root, "img", "alt").as_deref(), Some("Pinnacle"));
        assert_eq!(safe_select_text(&root, "span.missing"), None);
    }
}
