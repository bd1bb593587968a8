//! HTTP surface modules (router, handlers, middleware).

/// Shared constants and header names for HTTP surfaces.
pub mod constants;
/// Problem response helpers and error types.
pub mod errors;
/// Liveness and metrics endpoints.
pub mod health;
/// Router construction and server host.
pub mod router;
/// Metrics middleware for HTTP requests.
pub mod telemetry;
/// Arr webhook receiver.
pub mod webhook;
