#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Telemetry primitives shared across the trackswap workspace.
//!
//! Layout: `init.rs` (subscriber installation), `context.rs` (span helpers),
//! `layers.rs` (request-id middleware), `metrics.rs` (Prometheus registry),
//! `error.rs` (`TelemetryError`).

pub mod context;
pub mod error;
pub mod init;
pub mod layers;
pub mod metrics;

pub use context::{GlobalContextGuard, current_request_id, with_request_context};
pub use error::{Result, TelemetryError};
pub use init::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging, log_format_from_str,
};
pub use layers::{REQUEST_ID_HEADER, propagate_request_id_layer, set_request_id_layer};
pub use metrics::{EditResult, Metrics, MetricsSnapshot, WebhookOutcome};
