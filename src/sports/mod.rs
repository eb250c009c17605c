//! Supported leagues and per-league model parameters

pub mod leagues;
pub mod params;

pub use leagues::{league_info, leagues_by_priority, leagues_by_sport, LeagueInfo};
pub use params::{
    anomaly_threshold, ev_threshold, league_params, min_bookmakers, sport_config, MarketParams,
    SportConfigError,
};
