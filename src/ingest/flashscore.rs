//! Flashscore odds pages: market URLs and odds-table parsing

use crate::ingest::errors::{validate_quote, ScraperError};
use crate::ingest::fetcher::PageFetcher;
use crate::ingest::html::{extract_sport_type, safe_select_attr, safe_select_text, selector};
use crate::ingest::odds_parser::{extract_line, normalize_bookmaker_name, parse_odds_value, MarketKind};
use crate::types::{OddsQuote, Sport};
use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};

const ROW_SELECTOR: &str = "div.ui-table__row";
const BOOKMAKER_IMG_SELECTOR: &str = ".oddsCell__bookmakerCell a.prematchLink img";
const BOOKMAKER_LINK_SELECTOR: &str = ".oddsCell__bookmakerCell a";
const LINE_SELECTOR: &str = "div[class*='wcl-oddsCell'] span[class*='wcl-oddsValue']";
const ODDS_SELECTOR: &str = "a.oddsCell__odd";

/// Markets fetched for each sport
pub fn markets_for_sport(sport: Sport) -> &'static [MarketKind] {
    match sport {
        Sport::Basketball => &[MarketKind::Total, MarketKind::Spread, MarketKind::Moneyline],
        Sport::Football => &[MarketKind::Total, MarketKind::OneXTwo, MarketKind::Btts],
        Sport::Tennis => &[MarketKind::Moneyline, MarketKind::TotalGames],
    }
}

fn market_path(market: MarketKind) -> &'static str {
    match market {
        MarketKind::Total | MarketKind::TotalGames => "odds/over-under/full-time/",
        MarketKind::Spread | MarketKind::HandicapSets => "odds/asian-handicap/full-time/",
        MarketKind::Moneyline => "odds/home-away/full-time/",
        MarketKind::OneXTwo => "odds/1x2-odds/full-time/",
        MarketKind::Btts => "odds/both-teams-to-score/full-time/",
    }
}

/// Odds tab URL for an event. Other query parameters are dropped; `mid` is kept.
pub fn market_url(event_url: &str, market: MarketKind) -> String {
    let (base, query) = match event_url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (event_url, None),
    };

    let mid = query.and_then(|q| {
        q.split('&')
            .find_map(|pair| pair.strip_prefix("mid="))
            .map(|v| v.trim_end_matches('/'))
            .filter(|v| !v.is_empty())
    });

    let mut url = format!("{}/{}", base.trim_end_matches('/'), market_path(market));
    if let Some(mid) = mid {
        url.push_str("?mid=");
        url.push_str(mid);
    }
    url
}

fn row_bookmaker(row: &ElementRef<'_>) -> Option<String> {
    safe_select_attr(row, BOOKMAKER_IMG_SELECTOR, "alt")
        .or_else(|| safe_select_attr(row, BOOKMAKER_LINK_SELECTOR, "title"))
        .map(|name| normalize_bookmaker_name(&name))
}

/// Parse every bookmaker row of an odds table. Rows without a bookmaker, a
/// required line, or a full set of valid prices are skipped.
pub fn parse_market_table(html: &str, market: MarketKind) -> Result<Vec<OddsQuote>, ScraperError> {
    let document = Html::parse_document(html);
    let row_sel = selector(ROW_SELECTOR)?;
    let odds_sel = selector(ODDS_SELECTOR)?;
    let selections = market.selections();

    let mut quotes = Vec::new();
    for row in document.select(&row_sel) {
        let Some(bookmaker) = row_bookmaker(&row) else {
            continue;
        };

        let line = if market.has_line() {
            match safe_select_text(&row, LINE_SELECTOR).as_deref().and_then(extract_line) {
                Some(line) => Some(line),
                None => {
                    debug!("No line for {} row at {}", market, bookmaker);
                    continue;
                }
            }
        } else {
            None
        };

        let prices: Vec<Option<f64>> = row
            .select(&odds_sel)
            .map(|cell| parse_odds_value(&cell.text().collect::<String>()))
            .collect();
        if prices.len() < selections.len() || prices[..selections.len()].iter().any(Option::is_none) {
            debug!("Incomplete {} prices for {}", market, bookmaker);
            continue;
        }

        for (selection, price) in selections.iter().zip(prices) {
            let Some(odds) = price else { continue };
            let quote = OddsQuote {
                market: market.as_str().to_string(),
                line,
                bookmaker: bookmaker.clone(),
                selection: selection.to_string(),
                odds,
            };
            match validate_quote(&quote) {
                Ok(()) => quotes.push(quote),
                Err(e) => debug!("Dropping quote: {}", e),
            }
        }
    }
    Ok(quotes)
}

/// Odds source backed by Flashscore odds tabs
#[derive(Clone)]
pub struct FlashscoreProvider {
    fetcher: PageFetcher,
}

impl FlashscoreProvider {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &PageFetcher {
        &self.fetcher
    }

    /// Fetch one market tab
    pub async fn market_odds(
        &self,
        event_url: &str,
        market: MarketKind,
    ) -> Result<Vec<OddsQuote>, ScraperError> {
        let url = market_url(event_url, market);
        debug!("Scraping {} from {}", market, url);
        let html = self.fetcher.fetch_page(&url).await?;
        parse_market_table(&html, market)
    }

    /// All markets for an event, with the sport taken from the URL
    pub async fn odds_for_event(&self, event_url: &str) -> Result<Vec<OddsQuote>, ScraperError> {
        match extract_sport_type("", Some(event_url)) {
            Some(sport) => self.odds_for_sport_event(sport, event_url).await,
            None => {
                warn!("Could not detect sport from URL: {}", event_url);
                Ok(Vec::new())
            }
        }
    }

    /// All markets for an event of a known sport. A failing market is skipped;
    /// an open circuit aborts the event.
    pub async fn odds_for_sport_event(
        &self,
        sport: Sport,
        event_url: &str,
    ) -> Result<Vec<OddsQuote>, ScraperError> {
        let mut all = Vec::new();
        for &market in markets_for_sport(sport) {
            match self.market_odds(event_url, market).await {
                Ok(quotes) => all.extend(quotes),
                Err(ScraperError::CircuitOpen) => return Err(ScraperError::CircuitOpen),
                Err(e) => debug!("Error scraping {} for {}: {}", market, event_url, e),
            }
        }
        info!("Extracted {} odds from {}", all.len(), event_url);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(bookmaker: &str, line: Option<&str>, odds: &[&str]) -> String {
        let line_cell = line
            .map(|l| {
                format!(
                    r#"<div class="wcl-oddsCell_qJ5md"><span class="wcl-oddsValue_3e8Cq">{}</span></div>"#,
                    l
                )
            })
            .unwrap_or_default();
        let odds_cells: String = odds
            .iter()
            .map(|o| format!(r#"<a class="oddsCell__odd">{}</a>"#, o))
            .collect();
        format!(
            r#"<div class="ui-table__row"><div class="oddsCell__bookmakerCell"><a class="prematchLink"><img alt="{}"></a></div>{}{}</div>"#,
            bookmaker, line_cell, odds_cells
        )
    }

    fn page(rows: &[String]) -> String {
        format!("<html><body><div class=\"ui-table\">{}</div></body></html>", rows.concat())
    }

    #[test]
    fn test_market_url_keeps_mid() {
        assert_eq!(
            market_url(
                "https://www.flashscore.com/match/basketball/lakers-AbCd1234/celtics-XyZw9876/?mid=Q1w2E3r4",
                MarketKind::Total
            ),
            "https://www.flashscore.com/match/basketball/lakers-AbCd1234/celtics-XyZw9876/odds/over-under/full-time/?mid=Q1w2E3r4"
        );
        assert_eq!(
            market_url("https://www.flashscore.com/match/abc123/", MarketKind::OneXTwo),
            "https://www.flashscore.com/match/abc123/odds/1x2-odds/full-time/"
        );
    }

    #[test]
    fn test_parse_total_table() {
        let html = page(&[
            row("bet365", Some("220.5"), &["1.90", "1.90"]),
            row("Pinnacle", Some("221.5"), &["1,95", "1.87"]),
            row("NoLine", None, &["1.90", "1.90"]),
            row("Broken", Some("220.5"), &["1.90", "-"]),
        ]);
        let quotes = parse_market_table(&html, MarketKind::Total).unwrap();
        assert_eq!(quotes.len(), 4);
        assert_eq!(quotes[0].bookmaker, "Bet365");
        assert_eq!(quotes[0].selection, "OVER");
        assert_eq!(quotes[1].selection, "UNDER");
        assert_eq!(quotes[2].line, Some(221.5));
        assert!((quotes[2].odds - 1.95).abs() < 1e-9);
    }

    #[test]
    fn test_parse_1x2_and_btts() {
        let html = page(&[row("Betway", None, &["2.10", "3.40", "3.60"])]);
        let quotes = parse_market_table(&html, MarketKind::OneXTwo).unwrap();
        let selections: Vec<_> = quotes.iter().map(|q| q.selection.as_str()).collect();
        assert_eq!(selections, vec!["HOME", "DRAW", "AWAY"]);
        assert!(quotes.iter().all(|q| q.line.is_none()));

        let html = page(&[row("Unibet", None, &["1.80", "2.00"])]);
        let quotes = parse_market_table(&html, MarketKind::Btts).unwrap();
        assert_eq!(quotes[0].selection, "YES");
        assert_eq!(quotes[1].selection, "NO");
    }

    #[test]
    fn test_parse_spread_negative_line() {
        let html = page(&[row("1xBet", Some("-5.5"), &["1.91", "1.91"])]);
        let quotes = parse_market_table(&html, MarketKind::Spread).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].line, Some(-5.5));
        assert_eq!(quotes[0].selection, "HOME");
    }

    #[test]
    fn test_markets_for_sport() {
        assert_eq!(markets_for_sport(Sport::Football).len(), 3);
        assert!(markets_for_sport(Sport::Tennis).contains(&MarketKind::TotalGames));
    }
}
