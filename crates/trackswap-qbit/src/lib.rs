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

//! Client for the subset of the qBittorrent Web API (`/api/v2`) the relay
//! needs: login, torrent lookup, tracker listing and tracker editing.
//!
//! Layout: `client.rs` (`QbClient` + `QbSession`), `models.rs` (wire DTOs),
//! `error.rs` (`QbError`).

pub mod client;
pub mod error;
pub mod models;

pub use client::{LOGIN_ACK, QbClient, QbSession};
pub use error::{QbError, QbResult};
pub use models::{TorrentInfo, TrackerEntry};
