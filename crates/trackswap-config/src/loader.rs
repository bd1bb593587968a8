//! Environment parsing for [`RelayConfig`].
//!
//! # Design
//! - Reads every variable through a lookup closure so tests never touch the
//!   real process environment.
//! - Required variables fail fast with the variable name; optional ones fall
//!   back to the values in `defaults.rs`.

use std::net::IpAddr;
use std::time::Duration;

use url::Url;

use crate::defaults::{
    DEFAULT_BIND_ADDR, DEFAULT_HTTP_PORT, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_LOG_LEVEL,
    PROWLARR_INDEXER_SUFFIX,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{ListenerSettings, LogSettings, QbCredentials, RelayConfig, TrackerRewrite};

const ENV_QB_SERVER: &str = "QB_SERVER";
const ENV_USERNAME: &str = "USERNAME";
const ENV_PASSWORD: &str = "PASSWORD";
const ENV_DUMMY_TRACKER_PART: &str = "DUMMY_TRACKER_PART";
const ENV_REAL_TRACKER_PART: &str = "REAL_TRACKER_PART";
const ENV_INDEXER_NAME: &str = "INDEXER_NAME";
const ENV_BIND_ADDR: &str = "TRACKSWAP_BIND_ADDR";
const ENV_HTTP_PORT: &str = "TRACKSWAP_HTTP_PORT";
const ENV_HTTP_TIMEOUT_SECS: &str = "TRACKSWAP_HTTP_TIMEOUT_SECS";
const ENV_LOG_LEVEL: &str = "TRACKSWAP_LOG_LEVEL";
const ENV_LOG_FORMAT: &str = "TRACKSWAP_LOG_FORMAT";

impl RelayConfig {
    /// Load the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnv`] when a required variable is unset and
    /// [`ConfigError::InvalidField`] when a value cannot be parsed.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration using an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`RelayConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::MissingEnv { name });

        let base_url = parse_base_url(&required(ENV_QB_SERVER)?)?;
        let username = required(ENV_USERNAME)?;
        let password = required(ENV_PASSWORD)?;

        let placeholder = required(ENV_DUMMY_TRACKER_PART)?;
        if placeholder.is_empty() {
            return Err(ConfigError::invalid(ENV_DUMMY_TRACKER_PART, placeholder, "empty"));
        }
        let replacement = required(ENV_REAL_TRACKER_PART)?;
        let indexer_name = strip_indexer_suffix(&required(ENV_INDEXER_NAME)?).to_string();

        let bind_addr = match lookup(ENV_BIND_ADDR) {
            Some(raw) => raw
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::invalid(ENV_BIND_ADDR, raw, "not_an_ip_address"))?,
            None => DEFAULT_BIND_ADDR,
        };
        let http_port = match lookup(ENV_HTTP_PORT) {
            Some(raw) => parse_port(&raw)?,
            None => DEFAULT_HTTP_PORT,
        };
        let timeout_secs = match lookup(ENV_HTTP_TIMEOUT_SECS) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    ConfigError::invalid(ENV_HTTP_TIMEOUT_SECS, raw, "not_a_positive_integer")
                })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            qbittorrent: QbCredentials {
                base_url,
                username,
                password,
                timeout: Duration::from_secs(timeout_secs),
            },
            rewrite: TrackerRewrite {
                placeholder,
                replacement,
            },
            indexer_name,
            listener: ListenerSettings {
                bind_addr,
                http_port,
            },
            logging: LogSettings {
                level: lookup(ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
                format: lookup(ENV_LOG_FORMAT),
            },
        })
    }
}

/// Remove the cosmetic ` (Prowlarr)` suffix Prowlarr appends to synced
/// indexer names. Only a single trailing occurrence is removed.
#[must_use]
pub fn strip_indexer_suffix(name: &str) -> &str {
    name.strip_suffix(PROWLARR_INDEXER_SUFFIX).unwrap_or(name)
}

fn parse_base_url(raw: &str) -> ConfigResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|_| ConfigError::invalid(ENV_QB_SERVER, raw, "not_a_url"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(ENV_QB_SERVER, raw, "unsupported_scheme"));
    }
    Ok(url)
}

fn parse_port(raw: &str) -> ConfigResult<u16> {
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ConfigError::invalid(ENV_HTTP_PORT, raw, "out_of_range")),
        Ok(port) => Ok(port),
    }
}
