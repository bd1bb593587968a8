//! # Design
//!
//! - Centralize application-level errors for bootstrap and serving.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: trackswap_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: trackswap_telemetry::TelemetryError,
    },
    /// The qBittorrent client could not be constructed.
    #[error("qBittorrent client operation failed")]
    QbClient {
        /// Operation identifier.
        operation: &'static str,
        /// Source client error.
        source: trackswap_qbit::QbError,
    },
    /// API server operations failed.
    #[error("api server operation failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source API server error.
        source: trackswap_api::ApiServerError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: trackswap_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: trackswap_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn qb_client(
        operation: &'static str,
        source: trackswap_qbit::QbError,
    ) -> Self {
        Self::QbClient { operation, source }
    }

    pub(crate) const fn api_server(
        operation: &'static str,
        source: trackswap_api::ApiServerError,
    ) -> Self {
        Self::ApiServer { operation, source }
    }
}
