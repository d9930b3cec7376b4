//! Console configuration parsed from environment variables.
//!
//! Parsing runs over a lookup function so tests can supply variables without
//! touching the process environment. Numeric values fall back to their
//! defaults when absent or unparsable, but an explicit zero duration is an
//! error since every timing here drives a timer or a backoff. Booleans are
//! strict.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE: &str = "localhost:3000";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_RECONNECT_INITIAL_MS: u64 = 1_000;
pub const DEFAULT_RECONNECT_MAX_MS: u64 = 10_000;
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_HEARTBEAT_TIMEOUT_MS: u64 = 7_500;
pub const DEFAULT_NOTIFICATION_TTL_MS: u64 = 2_000;
pub const DEFAULT_SCROLL_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_SESSION_PATH: &str = "dogeplus-session.json";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid boolean for {key}: {value:?} (expected true, false, 1 or 0)")]
    InvalidBool { key: String, value: String },
    #[error("{key} must be greater than zero")]
    ZeroDuration { key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request: Duration,
    pub connect: Duration,
}

/// Reconnect and heartbeat timings of the live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveTimings {
    pub reconnect_initial: Duration,
    pub reconnect_max: Duration,
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
}

impl Default for LiveTimings {
    fn default() -> Self {
        Self {
            reconnect_initial: Duration::from_millis(DEFAULT_RECONNECT_INITIAL_MS),
            reconnect_max: Duration::from_millis(DEFAULT_RECONNECT_MAX_MS),
            heartbeat_interval: Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL_MS),
            heartbeat_timeout: Duration::from_millis(DEFAULT_HEARTBEAT_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Backend host and port, without scheme.
    pub base: String,
    pub api_version: String,
    /// Selects `https`/`wss` over `http`/`ws`.
    pub production: bool,
    /// Serve fixture data instead of calling the backend.
    pub mock: bool,
    pub http: HttpTimeouts,
    pub live: LiveTimings,
    pub notification_ttl: Duration,
    pub scroll_interval: Duration,
    pub session_path: PathBuf,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE.to_owned(),
            api_version: DEFAULT_API_VERSION.to_owned(),
            production: false,
            mock: false,
            http: HttpTimeouts {
                request: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
                connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            },
            live: LiveTimings::default(),
            notification_ttl: Duration::from_millis(DEFAULT_NOTIFICATION_TTL_MS),
            scroll_interval: Duration::from_millis(DEFAULT_SCROLL_INTERVAL_MS),
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
        }
    }
}

impl ConsoleConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `DOGEPLUS_BASE_URL`: backend host, default `localhost:3000`
    /// - `DOGEPLUS_API_VERSION`: default `v1`
    /// - `DOGEPLUS_PRODUCTION`: `true|false|1|0`, default false
    /// - `DOGEPLUS_MOCK`: `true|false|1|0`, default false
    /// - `DOGEPLUS_REQUEST_TIMEOUT_SECS` / `DOGEPLUS_CONNECT_TIMEOUT_SECS`
    /// - `DOGEPLUS_RECONNECT_INITIAL_MS` / `DOGEPLUS_RECONNECT_MAX_MS`
    /// - `DOGEPLUS_HEARTBEAT_INTERVAL_MS` / `DOGEPLUS_HEARTBEAT_TIMEOUT_MS`
    /// - `DOGEPLUS_NOTIFICATION_TTL_MS`, `DOGEPLUS_SCROLL_INTERVAL_MS`
    /// - `DOGEPLUS_SESSION_PATH`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBool`] for a malformed boolean flag and
    /// [`ConfigError::ZeroDuration`] for a timing set to zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBool`] for a malformed boolean flag and
    /// [`ConfigError::ZeroDuration`] for a timing set to zero.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let string = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().trim_end_matches('/').to_owned())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };
        let duration = |key: &str, default: Duration, unit: fn(u64) -> Duration| {
            match lookup(key).and_then(|v| v.trim().parse::<u64>().ok()) {
                Some(0) => Err(ConfigError::ZeroDuration { key: key.to_owned() }),
                Some(value) => Ok(unit(value)),
                None => Ok(default),
            }
        };
        let millis = |key: &str, default: Duration| duration(key, default, Duration::from_millis);
        let secs = |key: &str, default: Duration| duration(key, default, Duration::from_secs);
        let flag = |key: &str| lookup(key).map(|v| parse_env_bool(key, &v)).transpose();

        Ok(Self {
            base: string("DOGEPLUS_BASE_URL", defaults.base),
            api_version: string("DOGEPLUS_API_VERSION", defaults.api_version),
            production: flag("DOGEPLUS_PRODUCTION")?.unwrap_or(defaults.production),
            mock: flag("DOGEPLUS_MOCK")?.unwrap_or(defaults.mock),
            http: HttpTimeouts {
                request: secs("DOGEPLUS_REQUEST_TIMEOUT_SECS", defaults.http.request)?,
                connect: secs("DOGEPLUS_CONNECT_TIMEOUT_SECS", defaults.http.connect)?,
            },
            live: LiveTimings {
                reconnect_initial: millis("DOGEPLUS_RECONNECT_INITIAL_MS", defaults.live.reconnect_initial)?,
                reconnect_max: millis("DOGEPLUS_RECONNECT_MAX_MS", defaults.live.reconnect_max)?,
                heartbeat_interval: millis("DOGEPLUS_HEARTBEAT_INTERVAL_MS", defaults.live.heartbeat_interval)?,
                heartbeat_timeout: millis("DOGEPLUS_HEARTBEAT_TIMEOUT_MS", defaults.live.heartbeat_timeout)?,
            },
            notification_ttl: millis("DOGEPLUS_NOTIFICATION_TTL_MS", defaults.notification_ttl)?,
            scroll_interval: millis("DOGEPLUS_SCROLL_INTERVAL_MS", defaults.scroll_interval)?,
            session_path: lookup("DOGEPLUS_SESSION_PATH")
                .filter(|v| !v.trim().is_empty())
                .map_or(defaults.session_path, PathBuf::from),
        })
    }

    /// HTTP API root, e.g. `http://localhost:3000/api/v1`.
    #[must_use]
    pub fn backend_url(&self) -> String {
        let scheme = if self.production { "https" } else { "http" };
        format!("{scheme}://{}/api/{}", self.base, self.api_version)
    }

    /// Live socket endpoint, e.g. `ws://localhost:3000/api/v1/ws`.
    #[must_use]
    pub fn ws_url(&self) -> String {
        let scheme = if self.production { "wss" } else { "ws" };
        format!("{scheme}://{}/api/{}/ws", self.base, self.api_version)
    }
}

/// Parse a boolean flag: `true`/`1` or `false`/`0`, nothing else.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBool`] for any other value.
pub fn parse_env_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ConfigError::InvalidBool { key: key.to_owned(), value: other.to_owned() }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
