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

//! Binary entrypoint for the trackswap webhook relay.

use trackswap_app::{AppResult, run_app};

/// Bootstraps the relay and blocks until Ctrl-C.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
