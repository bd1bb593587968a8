//! Default values applied when optional environment variables are absent.

use std::net::{IpAddr, Ipv4Addr};

/// Listener address used when `TRACKSWAP_BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
/// Listener port used when `TRACKSWAP_HTTP_PORT` is unset.
pub const DEFAULT_HTTP_PORT: u16 = 8000;
/// Outbound request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Log filter used when neither `RUST_LOG` nor `TRACKSWAP_LOG_LEVEL` is set.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Cosmetic suffix Prowlarr appends to synced indexer names.
pub const PROWLARR_INDEXER_SUFFIX: &str = " (Prowlarr)";
