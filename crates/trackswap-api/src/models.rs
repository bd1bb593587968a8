//! Webhook payload and response DTOs.
//!
//! Arr-style notifiers send camelCase JSON with many more fields than the
//! relay reads. Every field here is optional so a payload of unexpected shape
//! is screened explicitly instead of failing deserialisation.

use serde::{Deserialize, Serialize};
use trackswap_telemetry::MetricsSnapshot;

/// RFC9457-compatible problem document surfaced on validation/runtime errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short, human-readable summary.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Occurrence-specific explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Inbound webhook notification (Sonarr/Radarr/Prowlarr "on grab" and test events).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookEvent {
    /// Event tag such as `Grab` or `Test`.
    pub event_type: Option<String>,
    /// Name of the notifier instance that sent the event.
    pub instance_name: Option<String>,
    /// Application the event originated from when relayed through Prowlarr.
    pub source: Option<String>,
    /// Download client identifier; the torrent info-hash for qBittorrent.
    pub download_id: Option<String>,
    /// Release the event refers to.
    pub release: Option<ReleaseInfo>,
}

impl WebhookEvent {
    /// Indexer the release was grabbed from, if reported.
    #[must_use]
    pub fn indexer(&self) -> Option<&str> {
        self.release
            .as_ref()
            .and_then(|release| release.indexer.as_deref())
    }

    /// Release title, logged alongside the outcome.
    #[must_use]
    pub fn release_title(&self) -> Option<&str> {
        self.release
            .as_ref()
            .and_then(|release| release.release_title.as_deref())
    }
}

/// Nested release descriptor of a [`WebhookEvent`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReleaseInfo {
    /// Indexer name as known to the notifier.
    pub indexer: Option<String>,
    /// Release title.
    pub release_title: Option<String>,
}

/// Informational body returned when an event is acknowledged without action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookSkipped {
    /// Why the event was not acted on.
    pub detail: String,
}

/// Body returned after the tracker pass completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackerUpdated {
    /// Fixed acknowledgment, `Tracker updated`.
    pub message: String,
    /// Display name of the torrent that was processed.
    pub torrent: String,
}

/// Liveness response for `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: &'static str,
    /// Build identifier recorded at start-up.
    pub build: String,
    /// Relay counters since start-up.
    pub metrics: MetricsSnapshot,
}
