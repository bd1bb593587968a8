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

//! Environment-backed configuration for the trackswap relay.
//!
//! Layout: `model.rs` (typed settings), `loader.rs` (environment parsing),
//! `defaults.rs` (fallback values), `error.rs` (`ConfigError`).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::strip_indexer_suffix;
pub use model::{ListenerSettings, LogSettings, QbCredentials, RelayConfig, TrackerRewrite};
