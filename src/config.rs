//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `FRUITMART_HOST` - Bind address for the API and metrics servers (default: 127.0.0.1)
//! - `FRUITMART_PORT` - API port (default: 8080)
//! - `FRUITMART_METRICS_PORT` - Prometheus scrape port (default: 9090)
//! - `FRUITMART_STORE` - Event store backend, `memory` or `scylla` (default: memory)
//! - `SCYLLA_NODES` - Comma separated contact points (default: 127.0.0.1:9042)
//! - `SCYLLA_KEYSPACE` - Keyspace holding the event table (default: fruitmart)
//! - `RECEIPT_MAX_ATTEMPTS` - Attempts per receipt job before dead-lettering (default: 5)
//! - `RECEIPT_ARCHIVE_CAPACITY` - Receipts kept in memory, oldest evicted first (default: 10000)
//! - `RECEIPT_DEAD_LETTER_CAPACITY` - Failed receipt jobs kept for inspection (default: 1000)

use std::net::IpAddr;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Scylla,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "scylla" => Ok(StoreBackend::Scylla),
            other => Err(format!("expected 'memory' or 'scylla', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    pub nodes: Vec<String>,
    pub keyspace: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub metrics_port: u16,
    pub store: StoreBackend,
    pub scylla: ScyllaConfig,
    pub receipt_max_attempts: u32,
    pub receipt_archive_capacity: usize,
    pub receipt_dead_letter_capacity: usize,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// Calls `dotenvy::dotenv()` first so a local `.env` file is honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from any name → value lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str, default: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let nodes = get("SCYLLA_NODES", "127.0.0.1:9042")
            .split(',')
            .map(str::trim)
            .filter(|node| !node.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            host: parse_var("FRUITMART_HOST", &get("FRUITMART_HOST", "127.0.0.1"))?,
            port: parse_var("FRUITMART_PORT", &get("FRUITMART_PORT", "8080"))?,
            metrics_port: parse_var("FRUITMART_METRICS_PORT", &get("FRUITMART_METRICS_PORT", "9090"))?,
            store: parse_var("FRUITMART_STORE", &get("FRUITMART_STORE", "memory"))?,
            scylla: ScyllaConfig {
                nodes,
                keyspace: get("SCYLLA_KEYSPACE", "fruitmart"),
            },
            receipt_max_attempts: parse_var("RECEIPT_MAX_ATTEMPTS", &get("RECEIPT_MAX_ATTEMPTS", "5"))?,
            receipt_archive_capacity: parse_var(
                "RECEIPT_ARCHIVE_CAPACITY",
                &get("RECEIPT_ARCHIVE_CAPACITY", "10000"),
            )?,
            receipt_dead_letter_capacity: parse_var(
                "RECEIPT_DEAD_LETTER_CAPACITY",
                &get("RECEIPT_DEAD_LETTER_CAPACITY", "1000"),
            )?,
        })
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))
}
