//! Shared HTTP constants (headers, routes, problem URIs).

pub(crate) const HEADER_REQUEST_ID: &str = trackswap_telemetry::REQUEST_ID_HEADER;

pub(crate) const ROUTE_UPDATE_TRACKER: &str = "/update_tracker";
pub(crate) const ROUTE_HEALTH: &str = "/health";
pub(crate) const ROUTE_METRICS: &str = "/metrics";

pub(crate) const PROBLEM_INTERNAL: &str = "https://trackswap.dev/problems/internal";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://trackswap.dev/problems/bad-request";
pub(crate) const PROBLEM_NOT_FOUND: &str = "https://trackswap.dev/problems/not-found";
pub(crate) const PROBLEM_UPSTREAM_LOGIN: &str = "https://trackswap.dev/problems/upstream-login";

pub(crate) const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";
