//! `POST /update_tracker`: screen an Arr notification and, when it concerns
//! the configured indexer, rewrite the torrent's placeholder trackers.
//!
//! Screening runs top to bottom and the first matching rule answers:
//! test events, Prowlarr proxy relays and foreign indexers are acknowledged
//! with 200 and never reach qBittorrent.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use tracing::{info, warn};
use trackswap_telemetry::{WebhookOutcome, current_request_id};

use crate::http::errors::ApiError;
use crate::models::{TrackerUpdated, WebhookEvent, WebhookSkipped};
use crate::relay::{RelayError, relay_download};
use crate::state::ApiState;

const EVENT_TYPE_TEST: &str = "Test";
const PROWLARR: &str = "Prowlarr";

const DETAIL_TEST: &str = "Test event received";
const DETAIL_PROXY: &str = "Prowlarr acting as a proxy";
const DETAIL_SKIPPED: &str = "Changing tracker skipped";
const DETAIL_MISSING_HASH: &str = "Missing download ID (torrent hash)";
const DETAIL_LOGIN_FAILED: &str = "qBittorrent login failed";
const DETAIL_TORRENT_MISSING: &str = "Torrent not found";
const DETAIL_TRACKERS_MISSING: &str = "No trackers found for the torrent";
const MESSAGE_UPDATED: &str = "Tracker updated";

/// Verdict reached from the payload alone.
#[derive(Debug, PartialEq, Eq)]
enum Screening<'a> {
    Acknowledge(WebhookOutcome, &'static str),
    MissingHash,
    Relay(&'a str),
}

fn screen<'a>(event: &'a WebhookEvent, indexer_name: &str) -> Screening<'a> {
    if event.event_type.as_deref() == Some(EVENT_TYPE_TEST) {
        return Screening::Acknowledge(WebhookOutcome::Test, DETAIL_TEST);
    }
    if event.instance_name.as_deref() == Some(PROWLARR)
        && event.source.as_deref() != Some(PROWLARR)
    {
        return Screening::Acknowledge(WebhookOutcome::Proxy, DETAIL_PROXY);
    }
    if event.indexer() != Some(indexer_name) {
        return Screening::Acknowledge(WebhookOutcome::Skipped, DETAIL_SKIPPED);
    }
    match event.download_id.as_deref() {
        Some(hash) if !hash.is_empty() => Screening::Relay(hash),
        _ => Screening::MissingHash,
    }
}

pub(crate) async fn update_tracker(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<WebhookEvent>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(event) = payload.map_err(|rejection| {
        state.telemetry.inc_webhook(WebhookOutcome::Invalid);
        warn!(error = %rejection, "rejected webhook body");
        ApiError::bad_request(rejection.body_text())
    })?;

    let hash = match screen(&event, state.indexer_name()) {
        Screening::Acknowledge(outcome, detail) => {
            state.telemetry.inc_webhook(outcome);
            info!(
                outcome = outcome.as_str(),
                event_type = event.event_type.as_deref().unwrap_or_default(),
                indexer = event.indexer().unwrap_or_default(),
                release = event.release_title().unwrap_or_default(),
                "webhook acknowledged without action"
            );
            let body = WebhookSkipped {
                detail: detail.to_string(),
            };
            return Ok(Json(body).into_response());
        }
        Screening::MissingHash => {
            state.telemetry.inc_webhook(WebhookOutcome::Invalid);
            return Err(ApiError::bad_request(DETAIL_MISSING_HASH));
        }
        Screening::Relay(hash) => hash,
    };

    match relay_download(&state.qbittorrent, state.rewrite(), hash, &state.telemetry).await {
        Ok(summary) => {
            state.telemetry.inc_webhook(WebhookOutcome::Updated);
            info!(
                hash = %hash,
                torrent = %summary.torrent,
                release = event.release_title().unwrap_or_default(),
                edited = summary.edited,
                failed = summary.failed,
                "tracker pass complete"
            );
            Ok(Json(TrackerUpdated {
                message: MESSAGE_UPDATED.to_string(),
                torrent: summary.torrent,
            })
            .into_response())
        }
        Err(RelayError::LoginFailed { source }) => {
            state.telemetry.inc_webhook(WebhookOutcome::LoginFailed);
            warn!(
                hash = %hash,
                request_id = %current_request_id().unwrap_or_default(),
                error = %source,
                "qBittorrent login failed"
            );
            Err(ApiError::upstream_login(DETAIL_LOGIN_FAILED))
        }
        Err(RelayError::TorrentNotFound) => {
            state.telemetry.inc_webhook(WebhookOutcome::TorrentMissing);
            Err(ApiError::not_found(DETAIL_TORRENT_MISSING))
        }
        Err(RelayError::TrackersNotFound) => {
            state.telemetry.inc_webhook(WebhookOutcome::TrackersMissing);
            Err(ApiError::not_found(DETAIL_TRACKERS_MISSING))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReleaseInfo;

    fn event(event_type: &str, indexer: Option<&str>, download_id: Option<&str>) -> WebhookEvent {
        WebhookEvent {
            event_type: Some(event_type.to_string()),
            instance_name: Some("Sonarr".to_string()),
            source: None,
            download_id: download_id.map(str::to_string),
            release: Some(ReleaseInfo {
                indexer: indexer.map(str::to_string),
                release_title: None,
            }),
        }
    }

    #[test]
    fn test_event_wins_over_every_other_rule() {
        let payload = WebhookEvent {
            event_type: Some("Test".to_string()),
            ..WebhookEvent::default()
        };
        assert_eq!(
            screen(&payload, "MyTracker"),
            Screening::Acknowledge(WebhookOutcome::Test, DETAIL_TEST)
        );
    }

    #[test]
    fn prowlarr_proxy_is_acknowledged() {
        let mut payload = event("Grab", Some("MyTracker"), Some("abc"));
        payload.instance_name = Some("Prowlarr".to_string());
        payload.source = Some("Sonarr".to_string());
        assert_eq!(
            screen(&payload, "MyTracker"),
            Screening::Acknowledge(WebhookOutcome::Proxy, DETAIL_PROXY)
        );

        payload.source = None;
        assert!(matches!(
            screen(&payload, "MyTracker"),
            Screening::Acknowledge(WebhookOutcome::Proxy, _)
        ));

        payload.source = Some("Prowlarr".to_string());
        assert_eq!(screen(&payload, "MyTracker"), Screening::Relay("abc"));
    }

    #[test]
    fn foreign_or_absent_indexer_is_skipped() {
        let skipped = Screening::Acknowledge(WebhookOutcome::Skipped, DETAIL_SKIPPED);
        assert_eq!(screen(&event("Grab", Some("Other"), Some("abc")), "MyTracker"), skipped);
        assert_eq!(screen(&event("Grab", None, Some("abc")), "MyTracker"), skipped);
        let mut no_release = event("Grab", None, Some("abc"));
        no_release.release = None;
        assert_eq!(screen(&no_release, "MyTracker"), skipped);
    }

    #[test]
    fn indexer_check_precedes_download_id_check() {
        assert!(matches!(
            screen(&event("Grab", Some("Other"), None), "MyTracker"),
            Screening::Acknowledge(WebhookOutcome::Skipped, _)
        ));
        assert_eq!(
            screen(&event("Grab", Some("MyTracker"), None), "MyTracker"),
            Screening::MissingHash
        );
        assert_eq!(
            screen(&event("Grab", Some("MyTracker"), Some("")), "MyTracker"),
            Screening::MissingHash
        );
    }
}
