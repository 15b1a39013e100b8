//! Board configuration.
//!
//! Read once from the environment in `main` and handed to the pieces that
//! need it. Only the backend URL is required; every other value has a default,
//! and a value that does not parse falls back to that default with a warning.

use std::net::SocketAddr;
use std::time::Duration;

use tracing::warn;

use crate::api::{ApiClientConfig, DEFAULT_REQUEST_TIMEOUT, StoreId, StoreQuery};
use crate::cache::CacheConfig;
use crate::queue::DEFAULT_REFRESH_INTERVAL;
use crate::stores::DEFAULT_STORE_ID;

pub const ENV_API_URL: &str = "QUEUE_BOARD_API_URL";
pub const ENV_CACHE_DURATION: &str = "QUEUE_BOARD_CACHE_DURATION_MS";
pub const ENV_REFRESH_INTERVAL: &str = "QUEUE_BOARD_REFRESH_INTERVAL_MS";
pub const ENV_REQUEST_TIMEOUT: &str = "QUEUE_BOARD_REQUEST_TIMEOUT_MS";
pub const ENV_DEBUG: &str = "QUEUE_BOARD_DEBUG";
pub const ENV_MODE: &str = "QUEUE_BOARD_ENV";
pub const ENV_DEFAULT_STORE_ID: &str = "QUEUE_BOARD_DEFAULT_STORE_ID";
pub const ENV_REGION: &str = "QUEUE_BOARD_REGION";
pub const ENV_LISTEN_ADDR: &str = "QUEUE_BOARD_LISTEN_ADDR";
pub const ENV_STATIC_DIR: &str = "QUEUE_BOARD_STATIC_DIR";

const DEFAULT_CACHE_DURATION: Duration = Duration::from_millis(3_000);
const DEFAULT_REGION: &str = "HK";
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_STATIC_DIR: &str = "static";

/// Fatal configuration problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("QUEUE_BOARD_API_URL is not configured; the backend API URL is required")]
    MissingApiUrl,

    #[error("invalid QUEUE_BOARD_LISTEN_ADDR {value:?}: {message}")]
    InvalidListenAddr { value: String, message: String },
}

/// Everything the board needs to start.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub api_base_url: String,
    pub cache_duration: Duration,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
    /// Verbose request and cache logging.
    pub debug: bool,
    pub default_store_id: StoreId,
    pub region: String,
    pub listen_addr: SocketAddr,
    pub static_dir: String,
}

impl BoardConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to read each key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_base_url = read(ENV_API_URL).ok_or(ConfigError::MissingApiUrl)?;

        let listen_raw = read(ENV_LISTEN_ADDR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr: SocketAddr =
            listen_raw
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::InvalidListenAddr {
                    value: listen_raw.clone(),
                    message: e.to_string(),
                })?;

        let debug = read(ENV_DEBUG).is_some_and(|v| v == "true")
            || read(ENV_MODE).is_some_and(|v| v == "development");

        Ok(Self {
            api_base_url,
            cache_duration: millis_or(
                ENV_CACHE_DURATION,
                read(ENV_CACHE_DURATION),
                DEFAULT_CACHE_DURATION,
            ),
            refresh_interval: millis_or(
                ENV_REFRESH_INTERVAL,
                read(ENV_REFRESH_INTERVAL),
                DEFAULT_REFRESH_INTERVAL,
            ),
            request_timeout: millis_or(
                ENV_REQUEST_TIMEOUT,
                read(ENV_REQUEST_TIMEOUT),
                DEFAULT_REQUEST_TIMEOUT,
            ),
            debug,
            default_store_id: store_id_or_default(read(ENV_DEFAULT_STORE_ID)),
            region: read(ENV_REGION).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            listen_addr,
            static_dir: read(ENV_STATIC_DIR).unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
        })
    }

    pub fn api_client_config(&self) -> ApiClientConfig {
        ApiClientConfig::new(&self.api_base_url).with_timeout(self.request_timeout)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: self.cache_duration,
            ..CacheConfig::default()
        }
    }

    pub fn store_query(&self) -> StoreQuery {
        StoreQuery::for_region(&self.region)
    }
}

/// Positive millisecond count, or `default`.
fn millis_or(key: &str, raw: Option<String>, default: Duration) -> Duration {
    let Some(raw) = raw else {
        return default;
    };
    match raw.parse::<u64>() {
        Ok(ms) if ms > 0 => Duration::from_millis(ms),
        _ => {
            warn!(key, value = %raw, "invalid duration, using default");
            default
        }
    }
}

fn store_id_or_default(raw: Option<String>) -> StoreId {
    let Some(raw) = raw else {
        return DEFAULT_STORE_ID;
    };
    match raw.parse::<StoreId>() {
        Ok(id) if id > 0 => id,
        _ => {
            warn!(key = ENV_DEFAULT_STORE_ID, value = %raw, "invalid store id, using default");
            DEFAULT_STORE_ID
        }
    }
}
