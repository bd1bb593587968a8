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
#![allow(clippy::redundant_pub_crate)]

//! HTTP surface of the trackswap relay.
//!
//! Layout:
//! - `http/`: router, webhook/health handlers, problem responses, metrics middleware
//! - `relay.rs`: login → lookup → tracker rewrite pipeline against qBittorrent
//! - `models.rs`: webhook payload and response DTOs
//! - `state.rs`: shared handler state
//! - `error.rs`: bootstrap/serve errors

pub mod error;
pub mod http;
pub mod models;
pub(crate) mod relay;
pub mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
pub use state::ApiState;
