//! # peachy_core
//!
//! Core domain logic for PEACHY: Discord OAuth token handling, session
//! storage and provider-token extraction.

pub mod auth;
pub mod discord;
pub mod ids;
pub mod models;
pub mod session;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
