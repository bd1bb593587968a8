//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers built once at start-up and shared read-only.
//! - Secrets never appear in `Debug` output.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::Serialize;
use url::Url;

/// Immutable relay configuration assembled from the process environment.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Connection details for the qBittorrent Web API.
    pub qbittorrent: QbCredentials,
    /// Placeholder/real tracker substrings.
    pub rewrite: TrackerRewrite,
    /// Indexer whose events are acted on, with the Prowlarr suffix removed.
    pub indexer_name: String,
    /// Inbound listener settings.
    pub listener: ListenerSettings,
    /// Logging preferences handed to the telemetry crate.
    pub logging: LogSettings,
}

/// Base URL and login credentials for the qBittorrent Web API.
#[derive(Clone)]
pub struct QbCredentials {
    /// Web UI base URL, e.g. `http://qbittorrent:8080`.
    pub base_url: Url,
    /// Login username.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Timeout applied to every outbound request.
    pub timeout: Duration,
}

impl fmt::Debug for QbCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("QbCredentials")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Substring swap applied to tracker announce URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerRewrite {
    /// Substring advertised in the torrent's tracker URLs.
    pub placeholder: String,
    /// Substring that replaces every occurrence of the placeholder.
    pub replacement: String,
}

impl TrackerRewrite {
    /// Construct a rewrite rule.
    #[must_use]
    pub fn new(placeholder: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            replacement: replacement.into(),
        }
    }

    /// Returns the rewritten URL when `url` contains the placeholder.
    ///
    /// URLs that no longer contain the placeholder yield `None`, so applying
    /// the rule to an already rewritten tracker is a no-op.
    #[must_use]
    pub fn apply(&self, url: &str) -> Option<String> {
        if self.placeholder.is_empty() || !url.contains(&self.placeholder) {
            return None;
        }
        Some(url.replace(&self.placeholder, &self.replacement))
    }
}

/// Address the inbound webhook listener binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerSettings {
    /// Interface to bind.
    pub bind_addr: IpAddr,
    /// TCP port to bind.
    pub http_port: u16,
}

impl ListenerSettings {
    /// Combined socket address.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }
}

/// Logging preferences; `format` stays a raw string so this crate does not
/// depend on the subscriber implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Requested output format (`json` or `pretty`), if any.
    pub format: Option<String>,
}
