//! Web API module for betdesk
//!
//! JSON endpoints for the dashboard plus the basic-auth HTML alert table.

pub mod auth;
pub mod routes;
pub mod server;

pub use server::{create_app, serve, AppState};
