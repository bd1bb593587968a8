//! Failures while installing the subscriber or driving the Prometheus registry.

use thiserror::Error;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// A counter family was rejected at construction (bad name or labels).
    #[error("failed to build metrics collector")]
    MetricsCollector {
        /// Metric family name.
        name: &'static str,
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// The registry refused a collector, typically a duplicate name.
    #[error("failed to register metrics collector")]
    MetricsRegister {
        /// Metric family name.
        name: &'static str,
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// Text exposition failed.
    #[error("failed to encode metrics")]
    MetricsEncode {
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// The encoder produced bytes that are not UTF-8.
    #[error("metrics output was not valid utf-8")]
    MetricsUtf8 {
        /// Underlying conversion error.
        source: std::string::FromUtf8Error,
    },
}
