//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Outcome labels are closed enums so dashboards see a fixed label set.

use std::sync::Arc;

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Final disposition of a single webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Connectivity check sent by the notifier.
    Test,
    /// Event forwarded by Prowlarr on behalf of another application.
    Proxy,
    /// Event attributed to a different indexer.
    Skipped,
    /// Payload rejected before contacting qBittorrent.
    Invalid,
    /// Trackers were inspected and rewritten where needed.
    Updated,
    /// qBittorrent rejected the login.
    LoginFailed,
    /// No torrent matched the download identifier.
    TorrentMissing,
    /// The torrent reported no trackers.
    TrackersMissing,
}

impl WebhookOutcome {
    /// Label value recorded on `webhook_events_total`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Proxy => "proxy",
            Self::Skipped => "skipped",
            Self::Invalid => "invalid",
            Self::Updated => "updated",
            Self::LoginFailed => "login_failed",
            Self::TorrentMissing => "torrent_missing",
            Self::TrackersMissing => "trackers_missing",
        }
    }
}

/// Result of a single `editTracker` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditResult {
    /// qBittorrent accepted the edit.
    Ok,
    /// The edit call failed; sibling edits continue.
    Failed,
}

impl EditResult {
    /// Label value recorded on `tracker_edits_total`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
        }
    }
}

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    webhook_events_total: IntCounterVec,
    tracker_edits_total: IntCounterVec,
}

/// Snapshot of the relay counters for health reporting and tests.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    /// Webhooks that resulted in a tracker pass.
    pub webhooks_updated: u64,
    /// Webhooks short-circuited before contacting qBittorrent.
    pub webhooks_short_circuited: u64,
    /// Webhooks that failed after contacting qBittorrent.
    pub webhooks_failed: u64,
    /// Successful tracker edits.
    pub tracker_edits_ok: u64,
    /// Failed tracker edits.
    pub tracker_edits_failed: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = counter_vec(
            "http_requests_total",
            "Total HTTP requests received",
            &["route", "code"],
        )?;
        let webhook_events_total = counter_vec(
            "webhook_events_total",
            "Webhook deliveries by outcome",
            &["outcome"],
        )?;
        let tracker_edits_total = counter_vec(
            "tracker_edits_total",
            "qBittorrent editTracker calls by result",
            &["result"],
        )?;

        register(&registry, "http_requests_total", &http_requests_total)?;
        register(&registry, "webhook_events_total", &webhook_events_total)?;
        register(&registry, "tracker_edits_total", &tracker_edits_total)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                webhook_events_total,
                tracker_edits_total,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Record the outcome of a webhook delivery.
    pub fn inc_webhook(&self, outcome: WebhookOutcome) {
        self.inner
            .webhook_events_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Record the result of a tracker edit.
    pub fn inc_tracker_edit(&self, result: EditResult) {
        self.inner
            .tracker_edits_total
            .with_label_values(&[result.as_str()])
            .inc();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the relay counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let webhook = |outcome: WebhookOutcome| {
            self.inner
                .webhook_events_total
                .with_label_values(&[outcome.as_str()])
                .get()
        };
        let edits = |result: EditResult| {
            self.inner
                .tracker_edits_total
                .with_label_values(&[result.as_str()])
                .get()
        };

        MetricsSnapshot {
            webhooks_updated: webhook(WebhookOutcome::Updated),
            webhooks_short_circuited: webhook(WebhookOutcome::Test)
                + webhook(WebhookOutcome::Proxy)
                + webhook(WebhookOutcome::Skipped)
                + webhook(WebhookOutcome::Invalid),
            webhooks_failed: webhook(WebhookOutcome::LoginFailed)
                + webhook(WebhookOutcome::TorrentMissing)
                + webhook(WebhookOutcome::TrackersMissing),
            tracker_edits_ok: edits(EditResult::Ok),
            tracker_edits_failed: edits(EditResult::Failed),
        }
    }
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn register(registry: &Registry, name: &'static str, collector: &IntCounterVec) -> Result<()> {
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_snapshot_reflects_updates() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_http_request("/update_tracker", 200);
        metrics.inc_webhook(WebhookOutcome::Test);
        metrics.inc_webhook(WebhookOutcome::Skipped);
        metrics.inc_webhook(WebhookOutcome::Updated);
        metrics.inc_webhook(WebhookOutcome::LoginFailed);
        metrics.inc_tracker_edit(EditResult::Ok);
        metrics.inc_tracker_edit(EditResult::Ok);
        metrics.inc_tracker_edit(EditResult::Failed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.webhooks_updated, 1);
        assert_eq!(snapshot.webhooks_short_circuited, 2);
        assert_eq!(snapshot.webhooks_failed, 1);
        assert_eq!(snapshot.tracker_edits_ok, 2);
        assert_eq!(snapshot.tracker_edits_failed, 1);

        let rendered = metrics.render()?;
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains("webhook_events_total{outcome=\"updated\"} 1"));
        assert!(rendered.contains("tracker_edits_total{result=\"failed\"} 1"));
        Ok(())
    }

    #[test]
    fn snapshot_serializes_to_json() -> std::result::Result<(), serde_json::Error> {
        let json = serde_json::to_value(MetricsSnapshot::default())?;
        assert_eq!(json["tracker_edits_ok"], 0);
        Ok(())
    }
}
