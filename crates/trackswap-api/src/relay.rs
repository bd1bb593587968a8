//! qBittorrent side of a webhook: authenticate, locate the torrent, rewrite
//! its placeholder trackers.
//!
//! Every call is awaited in order on a session opened for this delivery only.
//! Lookup failures of any kind collapse into "not found"; individual edit
//! failures are logged and counted without aborting the pass.

use thiserror::Error;
use tracing::{debug, warn};
use trackswap_config::TrackerRewrite;
use trackswap_qbit::{QbClient, QbError, QbSession};
use trackswap_telemetry::{EditResult, Metrics};

/// Failures that end a relay pass early.
#[derive(Debug, Error)]
pub(crate) enum RelayError {
    #[error("qBittorrent login failed")]
    LoginFailed {
        #[source]
        source: QbError,
    },
    #[error("torrent not found")]
    TorrentNotFound,
    #[error("torrent has no trackers")]
    TrackersNotFound,
}

/// What a completed pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RelaySummary {
    pub(crate) torrent: String,
    pub(crate) edited: usize,
    pub(crate) failed: usize,
}

pub(crate) async fn relay_download(
    client: &QbClient,
    rewrite: &TrackerRewrite,
    hash: &str,
    telemetry: &Metrics,
) -> Result<RelaySummary, RelayError> {
    let session = client
        .login()
        .await
        .map_err(|source| RelayError::LoginFailed { source })?;

    let torrent = match session.torrent_by_hash(hash).await {
        Ok(Some(torrent)) => torrent,
        Ok(None) => return Err(RelayError::TorrentNotFound),
        Err(err) => {
            warn!(hash = %hash, error = %err, "torrent lookup failed");
            return Err(RelayError::TorrentNotFound);
        }
    };

    let trackers = match session.trackers(hash).await {
        Ok(trackers) if !trackers.is_empty() => trackers,
        Ok(_) => return Err(RelayError::TrackersNotFound),
        Err(err) => {
            warn!(hash = %hash, error = %err, "tracker listing failed");
            return Err(RelayError::TrackersNotFound);
        }
    };

    let urls = trackers.iter().map(|tracker| tracker.url.as_str());
    let (edited, failed) = rewrite_trackers(&session, rewrite, hash, urls, telemetry).await;
    Ok(RelaySummary {
        torrent: torrent.name,
        edited,
        failed,
    })
}

async fn rewrite_trackers<'u>(
    session: &QbSession<'_>,
    rewrite: &TrackerRewrite,
    hash: &str,
    urls: impl Iterator<Item = &'u str>,
    telemetry: &Metrics,
) -> (usize, usize) {
    let mut edited = 0;
    let mut failed = 0;
    for orig_url in urls {
        let Some(new_url) = rewrite.apply(orig_url) else {
            debug!(url = %orig_url, "tracker has no placeholder");
            continue;
        };
        match session.edit_tracker(hash, orig_url, &new_url).await {
            Ok(()) => {
                telemetry.inc_tracker_edit(EditResult::Ok);
                edited += 1;
            }
            Err(err) => {
                telemetry.inc_tracker_edit(EditResult::Failed);
                warn!(
                    hash = %hash,
                    url = %orig_url,
                    endpoint = err.endpoint().unwrap_or_default(),
                    error = %err,
                    "tracker edit failed"
                );
                failed += 1;
            }
        }
    }
    (edited, failed)
}
