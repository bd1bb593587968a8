//! Shared handler state.

use std::sync::Arc;

use trackswap_config::{RelayConfig, TrackerRewrite};
use trackswap_qbit::QbClient;
use trackswap_telemetry::Metrics;

/// Immutable dependencies handed to every request handler.
pub struct ApiState {
    pub(crate) config: Arc<RelayConfig>,
    pub(crate) qbittorrent: QbClient,
    pub(crate) telemetry: Metrics,
}

impl ApiState {
    /// Bundle the configuration, qBittorrent client and metrics registry.
    #[must_use]
    pub const fn new(config: Arc<RelayConfig>, qbittorrent: QbClient, telemetry: Metrics) -> Self {
        Self {
            config,
            qbittorrent,
            telemetry,
        }
    }

    pub(crate) fn indexer_name(&self) -> &str {
        &self.config.indexer_name
    }

    pub(crate) fn rewrite(&self) -> &TrackerRewrite {
        &self.config.rewrite
    }
}
