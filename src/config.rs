//! Configuration management for the back-office service.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::ExchangeRates;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub dashboard: DashboardConfig,
    pub rates: RatesConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Worker threads handed to the astra server
    pub max_workers: usize,
}

/// SQLite configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path
    pub path: String,
    /// Schema applied on startup (idempotent `create table if not exists`)
    pub schema_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session TTL in seconds (default: 7 days)
    pub session_ttl_secs: i64,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Busy-hour ATV threshold used until a company sets its own
    pub default_busy_hour_threshold: i64,
    /// Tour length for tour types without `duration_hours`
    pub default_tour_minutes: u32,
    /// How far ahead a confirmed tour raises a `tour_start` notification
    pub tour_start_lead_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesConfig {
    /// Live EUR-based rates endpoint
    pub api_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Table served when neither stored nor live rates exist
    pub fallback: ExchangeRates,
}

impl RatesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key).and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn text(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup; unset or unparsable keys
    /// fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            server: ServerConfig {
                host: text(&lookup, "HOST", "127.0.0.1"),
                port: parsed(&lookup, "PORT", 3000),
                max_workers: parsed(&lookup, "MAX_WORKERS", 8),
            },
            database: DatabaseConfig {
                path: text(&lookup, "TOURDESK_DB_PATH", "tourdesk.sqlite3"),
                schema_path: text(&lookup, "TOURDESK_SCHEMA_PATH", "sql/schema.sql"),
            },
            auth: AuthConfig {
                session_ttl_secs: parsed(&lookup, "SESSION_TTL_SECS", 60 * 60 * 24 * 7),
                bcrypt_cost: parsed(&lookup, "BCRYPT_COST", 10),
            },
            dashboard: DashboardConfig {
                default_busy_hour_threshold: parsed(&lookup, "DEFAULT_BUSY_HOUR_THRESHOLD", 5),
                default_tour_minutes: parsed(&lookup, "DEFAULT_TOUR_MINUTES", 120),
                tour_start_lead_minutes: parsed(&lookup, "TOUR_START_LEAD_MINUTES", 30),
            },
            rates: RatesConfig {
                api_url: text(
                    &lookup,
                    "RATES_API_URL",
                    "https://api.exchangerate-api.com/v4/latest/EUR",
                ),
                timeout_secs: parsed(&lookup, "RATES_TIMEOUT_SECS", 5),
                fallback: ExchangeRates::default(),
            },
        }
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
