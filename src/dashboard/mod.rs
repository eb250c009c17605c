//! Dashboard shell: typed API client, filters and terminal views

pub mod client;
pub mod filters;
pub mod types;
pub mod view;

pub use client::{DashboardClient, DashboardData};
pub use types::{
    AlertType, AlertsResponse, ApiAlert, ApiAlertType, DashboardStats, FilterState, MarketType,
    SportsResponse, StatsResponse,
};
