//! Odds ingestion: page fetching, listing discovery and odds-table parsing

pub mod discovery;
pub mod errors;
pub mod fetcher;
pub mod flashscore;
pub mod html;
pub mod odds_parser;

pub use discovery::EventDiscovery;
pub use errors::ScraperError;
pub use fetcher::PageFetcher;
pub use flashscore::FlashscoreProvider;
pub use odds_parser::MarketKind;
