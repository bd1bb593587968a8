//! Wire DTOs returned by the qBittorrent Web API.
//!
//! Only the fields the relay reads are modelled; everything else in the
//! payload is ignored.

use serde::{Deserialize, Serialize};

/// Entry of `GET /api/v2/torrents/info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentInfo {
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Entry of `GET /api/v2/torrents/trackers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerEntry {
    /// Announce URL, or a pseudo entry such as `** [DHT] **`.
    pub url: String,
}
