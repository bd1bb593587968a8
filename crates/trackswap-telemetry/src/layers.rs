//! `x-request-id` handling shared by every HTTP surface.
//!
//! The set layer mints a UUID when the caller sent none; the propagate layer
//! copies the id onto the response. Stack propagate outside set so a minted
//! id is echoed too.

use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Mint a UUID v4 `x-request-id` for requests that arrive without one.
#[must_use]
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Echo the request's `x-request-id` on the response.
#[must_use]
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}
