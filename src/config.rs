use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path
    pub database_url: String,

    /// Plaintext proxy list, one `host:port:user:password` per line
    pub proxy_file: String,

    /// Steam Community Market price overview endpoint
    pub steam_api_url: String,

    /// Skinport bulk items endpoint
    pub skinport_api_url: String,

    /// Maximum number of Steam requests in flight across both scan loops
    pub max_concurrent_requests: usize,

    /// Interval in seconds between hot bucket scans
    pub hot_refresh_interval: u64,

    /// Interval in seconds between cold bucket scans
    pub cold_refresh_interval: u64,

    /// Number of fetch tasks dispatched together
    pub scan_batch_size: usize,

    /// Pause in milliseconds between two batches
    pub batch_pause_ms: u64,

    /// Timeout in seconds for a single HTTP call
    pub request_timeout: u64,

    /// Seconds to keep a concurrency slot after a 429
    pub rate_limit_backoff: u64,

    /// Items under this Skinport price may be classified hot
    pub hot_price_threshold: f64,

    /// Listen address of the deals endpoint
    pub api_bind_addr: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:data/skins.db".to_string()),

            proxy_file: env::var("PROXY_FILE").unwrap_or_else(|_| "proxies.txt".to_string()),

            steam_api_url: env::var("STEAM_API_URL").unwrap_or_else(|_| {
                "https://steamcommunity.com/market/priceoverview/".to_string()
            }),

            skinport_api_url: env::var("SKINPORT_API_URL")
                .unwrap_or_else(|_| "https://api.skinport.com/v1/items".to_string()),

            max_concurrent_requests: parse_var("MAX_CONCURRENT_REQUESTS", "5")?,
            hot_refresh_interval: parse_var("HOT_REFRESH_INTERVAL", "300")?,
            cold_refresh_interval: parse_var("COLD_REFRESH_INTERVAL", "3600")?,
            scan_batch_size: parse_var("SCAN_BATCH_SIZE", "50")?,
            batch_pause_ms: parse_var("BATCH_PAUSE_MS", "1000")?,
            request_timeout: parse_var("REQUEST_TIMEOUT", "30")?,
            rate_limit_backoff: parse_var("RATE_LIMIT_BACKOFF", "10")?,
            hot_price_threshold: parse_var("HOT_PRICE_THRESHOLD", "200")?,

            api_bind_addr: env::var("API_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

/// Read a variable, falling back to `default`, and parse it
fn parse_var<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("{} must be a valid number", key))
}
