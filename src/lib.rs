//! Multi-tenant tour reservation back office: the JSON service behind the
//! dashboard, plus the typed client workflow that drives it.
pub mod api;
pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod rates_feed;
pub mod responses;
pub mod router;
pub mod spreadsheets;
pub mod templates;

#[cfg(test)]
mod tests;
