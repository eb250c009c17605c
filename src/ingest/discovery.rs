//! Upcoming event discovery from Flashscore fixture listings

use crate::config::Flashscore;
use crate::ingest::errors::{validate_event, ScraperError};
use crate::ingest::fetcher::PageFetcher;
use crate::ingest::html::{clean_text, parse_time_string, selector};
use crate::types::{DiscoveredEvent, Sport};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::{error, info, warn};

/// A fixture listing and the league its events belong to
#[derive(Debug, Clone, Copy)]
pub struct ListingSource {
    pub sport: Sport,
    pub league: &'static str,
    pub path: &'static str,
}

const SOURCES: &[ListingSource] = &[
    ListingSource { sport: Sport::Basketball, league: "NBA", path: "/basketball/usa/nba/fixtures/" },
    ListingSource { sport: Sport::Basketball, league: "CBA", path: "/basketball/china/cba/fixtures/" },
    ListingSource { sport: Sport::Football, league: "Premier League", path: "/football/england/premier-league/fixtures/" },
    ListingSource { sport: Sport::Football, league: "La Liga", path: "/football/spain/laliga/fixtures/" },
    ListingSource { sport: Sport::Football, league: "Champions League", path: "/football/europe/champions-league/fixtures/" },
    ListingSource { sport: Sport::Tennis, league: "ATP", path: "/tennis/" },
];

pub fn sources_for(sport: Sport) -> Vec<ListingSource> {
    SOURCES.iter().filter(|s| s.sport == sport).copied().collect()
}

/// Event cap per discovery run
pub fn max_events(sport: Sport) -> usize {
    match sport {
        Sport::Basketball => 20,
        Sport::Football => 30,
        Sport::Tennis => 25,
    }
}

/// Live, in-progress or already scored rows
fn is_event_started(row: &ElementRef<'_>) -> bool {
    let class = row.value().attr("class").unwrap_or_default().to_lowercase();
    if ["live", "inprogress", "started"].iter().any(|k| class.contains(k)) {
        return true;
    }

    if let Ok(sel) = selector("[class*='event__stage']") {
        if let Some(stage) = row.select(&sel).next() {
            let text = stage.text().collect::<String>().to_lowercase();
            if ["live", "half", "ended"].iter().any(|k| text.contains(k)) {
                return true;
            }
        }
    }

    if let (Ok(sel), Ok(re)) = (
        selector("[class*='event__score']"),
        Regex::new(r"^\d+\s*[:\-]\s*\d+"),
    ) {
        if let Some(score) = row.select(&sel).next() {
            if re.is_match(clean_text(&score.text().collect::<String>()).as_str()) {
                return true;
            }
        }
    }
    false
}

fn text_of(row: &ElementRef<'_>, css: &str, nth: usize) -> Option<String> {
    let sel = selector(css).ok()?;
    let text = clean_text(&row.select(&sel).nth(nth)?.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

fn participants(row: &ElementRef<'_>) -> Option<(String, String)> {
    let home = text_of(row, "[class*='participant'][class*='home'], [class*='homeParticipant']", 0);
    let away = text_of(row, "[class*='participant'][class*='away'], [class*='awayParticipant']", 0);
    if let (Some(home), Some(away)) = (home, away) {
        return Some((home, away));
    }
    Some((
        text_of(row, "[class*='participant']", 0)?,
        text_of(row, "[class*='participant']", 1)?,
    ))
}

fn event_url(row: &ElementRef<'_>) -> Option<String> {
    let sel = selector("a[href]").ok()?;
    let href = row.select(&sel).next()?.value().attr("href")?.trim();
    if href.is_empty() {
        None
    } else if href.starts_with("http") {
        Some(href.to_string())
    } else {
        Some(format!("{}{}", Flashscore::BASE_URL, href))
    }
}

/// Listing start time. A bare `HH:MM` that already passed today is tomorrow;
/// `DD.MM. HH:MM` takes the current year. Unparseable times yield None.
pub fn parse_event_time(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if Regex::new(r"^\d{1,2}:\d{2}$").ok()?.is_match(text) {
        let today = parse_time_string(text, now)?;
        return Some(if today < now { today + Duration::days(1) } else { today });
    }

    if let Some(caps) = Regex::new(r"(\d{1,2})\.(\d{1,2})\..*?(\d{1,2}):(\d{2})")
        .ok()?
        .captures(text)
    {
        use chrono::Datelike;
        let date = NaiveDate::from_ymd_opt(now.year(), caps[2].parse().ok()?, caps[1].parse().ok()?)?;
        let naive = date.and_hms_opt(caps[3].parse().ok()?, caps[4].parse().ok()?, 0)?;
        return Some(Utc.from_utc_datetime(&naive));
    }

    parse_time_string(text, now)
}

/// Parse up to `limit` fixture rows, skipping started games and rows
/// without participants or a link.
pub fn parse_listing(
    html: &str,
    source: &ListingSource,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<Vec<DiscoveredEvent>, ScraperError> {
    let document = Html::parse_document(html);
    let match_sel = selector("div.event__match")?;

    let mut events = Vec::new();
    for row in document.select(&match_sel).take(limit) {
        if is_event_started(&row) {
            continue;
        }
        let Some((home, away)) = participants(&row) else {
            continue;
        };
        let Some(url) = event_url(&row) else {
            continue;
        };
        let start_time_utc = text_of(&row, "[class*='event__time']", 0)
            .and_then(|t| parse_event_time(&t, now));

        let event = DiscoveredEvent {
            sport: source.sport,
            league: source.league.to_string(),
            start_time_utc,
            home,
            away,
            url,
        };
        if validate_event(&event).is_ok() {
            events.push(event);
        }
    }
    Ok(events)
}

/// Finds upcoming events for each sport
#[derive(Clone)]
pub struct EventDiscovery {
    fetcher: PageFetcher,
}

impl EventDiscovery {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    /// Upcoming events for a sport. Failing listings are logged and skipped.
    pub async fn discover(&self, sport: Sport) -> Vec<DiscoveredEvent> {
        info!("{} Discovering {} events...", sport.emoji(), sport);

        let sources = sources_for(sport);
        let per_source = (max_events(sport) / sources.len().max(1)).max(1);
        let mut events = Vec::new();

        for source in &sources {
            let url = format!("{}{}", Flashscore::BASE_URL, source.path);
            let result = match self.fetcher.fetch_page(&url).await {
                Ok(html) => parse_listing(&html, source, per_source, Utc::now()),
                Err(e) => Err(e),
            };
            match result {
                Ok(found) => {
                    info!("{} {}: {} upcoming events", sport.emoji(), source.league, found.len());
                    events.extend(found);
                }
                Err(ScraperError::CircuitOpen) => {
                    warn!("Circuit open, stopping {} discovery", sport);
                    break;
                }
                Err(e) => error!("{} discovery failed for {}: {}", sport, source.league, e),
            }
        }

        if events.is_empty() {
            warn!("No events found for {}", sport);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const LISTING: &str = r#"<html><body>
        <div class="event__match event__match--scheduled">
            <div class="event__time">20:30</div>
            <div class="event__participant event__participant--home">Lakers</div>
            <div class="event__participant event__participant--away">Celtics</div>
            <a href="/match/basketball/lakers-AbCd1234/celtics-XyZw9876/?mid=Q1w2E3r4">odds</a>
        </div>
        <div class="event__match event__match--live">
            <div class="event__participant event__participant--home">Bulls</div>
            <div class="event__participant event__participant--away">Heat</div>
            <a href="/match/abc123/">odds</a>
        </div>
        <div class="event__match">
            <div class="event__time">10:00</div>
            <div class="event__homeParticipant">Nets</div>
            <div class="event__awayParticipant">Knicks</div>
            <div class="event__score">88 - 90</div>
            <a href="/match/def456/">odds</a>
        </div>
        <div class="event__match">
            <div class="event__time">09:00</div>
            <div class="event__participant event__participant--home">Suns</div>
            <div class="event__participant event__participant--away">Jazz</div>
            <a href="https://www.flashscore.com/match/ghi789/">odds</a>
        </div>
        <div class="event__match">
            <div class="event__participant event__participant--home">Solo</div>
        </div>
    </body></html>"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 25, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_listing() {
        let source = sources_for(Sport::Basketball)[0];
        let events = parse_listing(LISTING, &source, 10, now()).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].home, "Lakers");
        assert_eq!(events[0].away, "Celtics");
        assert_eq!(events[0].league, "NBA");
        assert!(events[0].url.starts_with("https://www.flashscore.com/match/basketball/"));
        assert_eq!(events[0].start_time_utc.unwrap().hour(), 20);

        // 09:00 already passed at noon, so it is tomorrow's game
        assert_eq!(events[1].home, "Suns");
        assert_eq!(
            events[1].start_time_utc,
            Some(Utc.with_ymd_and_hms(2024, 1, 26, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_listing_respects_limit() {
        let source = sources_for(Sport::Basketball)[0];
        let events = parse_listing(LISTING, &source, 1, now()).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_parse_event_time() {
        let t = parse_event_time("27.01. 18:45", now()).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 1, 27, 18, 45, 0).unwrap());
        assert!(parse_event_time("", now()).is_none());
        assert!(parse_event_time("Postp.", now()).is_none());
    }

    #[test]
    fn test_caps_and_sources() {
        assert_eq!(max_events(Sport::Basketball), 20);
        assert_eq!(max_events(Sport::Football), 30);
        assert_eq!(max_events(Sport::Tennis), 25);
        assert_eq!(sources_for(Sport::Football).len(), 3);
    }
}
