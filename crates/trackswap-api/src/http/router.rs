//! Router construction and server host for the relay API.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::Request,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::Span;
use trackswap_telemetry::{build_sha, propagate_request_id_layer, set_request_id_layer};

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::constants::{
    HEADER_REQUEST_ID, ROUTE_HEALTH, ROUTE_METRICS, ROUTE_UPDATE_TRACKER,
};
use crate::http::health::{health, metrics};
use crate::http::telemetry::HttpMetricsLayer;
use crate::http::webhook::update_tracker;
use crate::state::ApiState;

/// Axum router wrapper that hosts the webhook relay.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Wire the routes, request-id/trace/metrics layers and shared state.
    #[must_use]
    pub fn new(state: ApiState) -> Self {
        let telemetry = state.telemetry.clone();
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();

                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(trace_layer)
            .layer(HttpMetricsLayer::new(telemetry));

        let router = Router::new()
            .route(ROUTE_UPDATE_TRACKER, post(update_tracker))
            .route(ROUTE_HEALTH, get(health))
            .route(ROUTE_METRICS, get(metrics))
            .route_layer(layered)
            .with_state(Arc::new(state));

        Self { router }
    }

    /// Bind `addr` and serve until `shutdown` resolves; in-flight requests
    /// are drained before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server terminates unexpectedly.
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        tracing::info!(addr = %addr, "starting relay API");
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ApiServerError::Serve { source })?;
        tracing::info!("relay API stopped");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) const fn router(&self) -> &Router {
        &self.router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::constants::PROMETHEUS_CONTENT_TYPE;
    use anyhow::Result;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, StatusCode, header::CONTENT_TYPE};
    use httpmock::prelude::*;
    use serde_json::{Value, json};
    use std::net::{IpAddr, Ipv4Addr};
    use tower::ServiceExt;
    use trackswap_config::{
        ListenerSettings, LogSettings, QbCredentials, RelayConfig, TrackerRewrite,
    };
    use trackswap_qbit::QbClient;
    use trackswap_telemetry::Metrics;
    use url::Url;

    struct Harness {
        server: ApiServer,
        telemetry: Metrics,
    }

    fn harness(qb_base: &str) -> Result<Harness> {
        let base_url: Url = qb_base.parse()?;
        let config = RelayConfig {
            qbittorrent: QbCredentials {
                base_url: base_url.clone(),
                username: "admin".to_string(),
                password: "adminadmin".to_string(),
                timeout: Duration::from_secs(5),
            },
            rewrite: TrackerRewrite::new("dummy.example", "real.example"),
            indexer_name: "MyTracker".to_string(),
            listener: ListenerSettings {
                bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
                http_port: 8000,
            },
            logging: LogSettings {
                level: "info".to_string(),
                format: None,
            },
        };
        let telemetry = Metrics::new()?;
        let qbittorrent = QbClient::new(
            base_url,
            config.qbittorrent.username.clone(),
            config.qbittorrent.password.clone(),
            config.qbittorrent.timeout,
        )?;
        let state = ApiState::new(Arc::new(config), qbittorrent, telemetry.clone());
        Ok(Harness {
            server: ApiServer::new(state),
            telemetry,
        })
    }

    async fn post_webhook(server: &ApiServer, body: String) -> Result<(StatusCode, Value)> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(ROUTE_UPDATE_TRACKER)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))?;
        let response = server.router().clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    fn grab(download_id: &str) -> String {
        json!({
            "eventType": "Grab",
            "instanceName": "Sonarr",
            "downloadId": download_id,
            "release": {"indexer": "MyTracker"}
        })
        .to_string()
    }

    fn mock_login<'a>(server: &'a MockServer, body: &str) -> httpmock::Mock<'a> {
        let body = body.to_string();
        server.mock(move |when, then| {
            when.method(POST).path("/api/v2/auth/login");
            then.status(200)
                .header("set-cookie", "SID=relay-session; HttpOnly; path=/")
                .body(body);
        })
    }

    /// Every relay pass opens with a login, so zero login hits means no outbound traffic.
    fn mock_upstream(server: &MockServer) -> httpmock::Mock<'_> {
        mock_login(server, "Ok.")
    }

    #[tokio::test]
    async fn test_event_is_acknowledged_without_outbound_calls() -> Result<()> {
        let qb = MockServer::start_async().await;
        let upstream = mock_upstream(&qb);
        let harness = harness(&qb.base_url())?;

        let body = json!({"eventType": "Test", "instanceName": "Sonarr"}).to_string();
        let (status, payload) = post_webhook(&harness.server, body).await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload, json!({"detail": "Test event received"}));
        upstream.assert_calls(0);
        assert_eq!(harness.telemetry.snapshot().webhooks_short_circuited, 1);
        Ok(())
    }

    #[tokio::test]
    async fn prowlarr_proxy_event_is_acknowledged_without_outbound_calls() -> Result<()> {
        let qb = MockServer::start_async().await;
        let upstream = mock_upstream(&qb);
        let harness = harness(&qb.base_url())?;

        let body = json!({
            "eventType": "Grab",
            "instanceName": "Prowlarr",
            "source": "Sonarr",
            "downloadId": "abc123",
            "release": {"indexer": "MyTracker"}
        })
        .to_string();
        let (status, payload) = post_webhook(&harness.server, body).await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload, json!({"detail": "Prowlarr acting as a proxy"}));
        upstream.assert_calls(0);
        Ok(())
    }

    #[tokio::test]
    async fn foreign_indexer_is_skipped_without_outbound_calls() -> Result<()> {
        let qb = MockServer::start_async().await;
        let upstream = mock_upstream(&qb);
        let harness = harness(&qb.base_url())?;

        let body = json!({
            "eventType": "Grab",
            "downloadId": "abc123",
            "release": {"indexer": "SomeoneElse"}
        })
        .to_string();
        let (status, payload) = post_webhook(&harness.server, body).await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload, json!({"detail": "Changing tracker skipped"}));
        upstream.assert_calls(0);
        Ok(())
    }

    #[tokio::test]
    async fn missing_download_id_is_a_bad_request() -> Result<()> {
        let qb = MockServer::start_async().await;
        let upstream = mock_upstream(&qb);
        let harness = harness(&qb.base_url())?;

        let body = json!({"eventType": "Grab", "release": {"indexer": "MyTracker"}}).to_string();
        let (status, payload) = post_webhook(&harness.server, body).await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["status"], 400);
        assert_eq!(payload["detail"], "Missing download ID (torrent hash)");
        upstream.assert_calls(0);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() -> Result<()> {
        let qb = MockServer::start_async().await;
        let upstream = mock_upstream(&qb);
        let harness = harness(&qb.base_url())?;

        let (status, payload) = post_webhook(&harness.server, "{not json".to_string()).await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["title"], "bad request");
        upstream.assert_calls(0);
        Ok(())
    }

    #[tokio::test]
    async fn matching_grab_rewrites_only_placeholder_trackers() -> Result<()> {
        let qb = MockServer::start_async().await;
        let login = mock_login(&qb, "Ok.");
        let info = qb.mock(|when, then| {
            when.method(GET)
                .path("/api/v2/torrents/info")
                .query_param("hashes", "abc123")
                .header("cookie", "SID=relay-session");
            then.status(200)
                .json_body(json!([{"hash": "abc123", "name": "Show.S01E01.1080p"}]));
        });
        let trackers = qb.mock(|when, then| {
            when.method(GET)
                .path("/api/v2/torrents/trackers")
                .query_param("hash", "abc123");
            then.status(200).json_body(json!([
                {"url": "** [DHT] **", "status": 0},
                {"url": "http://dummy.example/announce", "status": 2},
                {"url": "http://other.example/announce", "status": 2}
            ]));
        });
        let edit = qb.mock(|when, then| {
            when.method(POST)
                .path("/api/v2/torrents/editTracker")
                .header("cookie", "SID=relay-session")
                .form_urlencoded_tuple("hash", "abc123")
                .form_urlencoded_tuple("origUrl", "http://dummy.example/announce")
                .form_urlencoded_tuple("newUrl", "http://real.example/announce");
            then.status(200);
        });
        let harness = harness(&qb.base_url())?;

        let (status, payload) = post_webhook(&harness.server, grab("abc123")).await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            payload,
            json!({"message": "Tracker updated", "torrent": "Show.S01E01.1080p"})
        );
        login.assert();
        info.assert();
        trackers.assert();
        edit.assert_calls(1);
        let snapshot = harness.telemetry.snapshot();
        assert_eq!(snapshot.webhooks_updated, 1);
        assert_eq!(snapshot.tracker_edits_ok, 1);
        assert_eq!(snapshot.tracker_edits_failed, 0);
        Ok(())
    }

    #[tokio::test]
    async fn trackers_without_placeholder_produce_no_edits() -> Result<()> {
        let qb = MockServer::start_async().await;
        mock_login(&qb, "Ok.");
        qb.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/info");
            then.status(200)
                .json_body(json!([{"hash": "abc123", "name": "Already.Fixed"}]));
        });
        qb.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/trackers");
            then.status(200)
                .json_body(json!([{"url": "http://real.example/announce"}]));
        });
        let edit = qb.mock(|when, then| {
            when.method(POST).path("/api/v2/torrents/editTracker");
            then.status(200);
        });
        let harness = harness(&qb.base_url())?;

        let (status, payload) = post_webhook(&harness.server, grab("abc123")).await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["torrent"], "Already.Fixed");
        edit.assert_calls(0);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_login_stops_before_lookup() -> Result<()> {
        let qb = MockServer::start_async().await;
        let login = mock_login(&qb, "Fails.");
        let info = qb.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/info");
            then.status(200).json_body(json!([]));
        });
        let harness = harness(&qb.base_url())?;

        let (status, payload) = post_webhook(&harness.server, grab("abc123")).await?;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(payload["detail"], "qBittorrent login failed");
        login.assert();
        info.assert_calls(0);
        assert_eq!(harness.telemetry.snapshot().webhooks_failed, 1);
        Ok(())
    }

    #[tokio::test]
    async fn login_error_status_is_a_server_error() -> Result<()> {
        let qb = MockServer::start_async().await;
        qb.mock(|when, then| {
            when.method(POST).path("/api/v2/auth/login");
            then.status(403).body("Forbidden");
        });
        let harness = harness(&qb.base_url())?;

        let (status, _) = post_webhook(&harness.server, grab("abc123")).await?;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_torrent_is_not_found_and_trackers_are_not_listed() -> Result<()> {
        let qb = MockServer::start_async().await;
        mock_login(&qb, "Ok.");
        qb.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/info");
            then.status(200).json_body(json!([]));
        });
        let trackers = qb.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/trackers");
            then.status(200).json_body(json!([]));
        });
        let harness = harness(&qb.base_url())?;

        let (status, payload) = post_webhook(&harness.server, grab("deadbeef")).await?;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(payload["detail"], "Torrent not found");
        trackers.assert_calls(0);
        Ok(())
    }

    #[tokio::test]
    async fn empty_tracker_list_is_not_found() -> Result<()> {
        let qb = MockServer::start_async().await;
        mock_login(&qb, "Ok.");
        qb.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/info");
            then.status(200)
                .json_body(json!([{"hash": "abc123", "name": "Lonely"}]));
        });
        qb.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/trackers");
            then.status(200).json_body(json!([]));
        });
        let harness = harness(&qb.base_url())?;

        let (status, payload) = post_webhook(&harness.server, grab("abc123")).await?;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(payload["detail"], "No trackers found for the torrent");
        Ok(())
    }

    #[tokio::test]
    async fn failed_edit_still_answers_tracker_updated() -> Result<()> {
        let qb = MockServer::start_async().await;
        mock_login(&qb, "Ok.");
        qb.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/info");
            then.status(200)
                .json_body(json!([{"hash": "abc123", "name": "Partial"}]));
        });
        qb.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/trackers");
            then.status(200).json_body(json!([
                {"url": "http://dummy.example/a"},
                {"url": "udp://dummy.example:6969/b"}
            ]));
        });
        let failing = qb.mock(|when, then| {
            when.method(POST)
                .path("/api/v2/torrents/editTracker")
                .form_urlencoded_tuple("origUrl", "http://dummy.example/a");
            then.status(500);
        });
        let later = qb.mock(|when, then| {
            when.method(POST)
                .path("/api/v2/torrents/editTracker")
                .form_urlencoded_tuple("origUrl", "udp://dummy.example:6969/b")
                .form_urlencoded_tuple("newUrl", "udp://real.example:6969/b");
            then.status(200);
        });
        let harness = harness(&qb.base_url())?;

        let (status, payload) = post_webhook(&harness.server, grab("abc123")).await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["message"], "Tracker updated");
        failing.assert();
        later.assert();
        let snapshot = harness.telemetry.snapshot();
        assert_eq!(snapshot.tracker_edits_failed, 1);
        assert_eq!(snapshot.tracker_edits_ok, 1);
        Ok(())
    }

    #[tokio::test]
    async fn health_reports_build_and_counters() -> Result<()> {
        let harness = harness("http://127.0.0.1:1")?;
        let request = Request::builder()
            .uri(ROUTE_HEALTH)
            .header(HEADER_REQUEST_ID, "req-health")
            .body(Body::empty())?;
        let response = harness.server.router().clone().oneshot(request).await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(HEADER_REQUEST_ID)
                .and_then(|value| value.to_str().ok()),
            Some("req-health")
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let payload: Value = serde_json::from_slice(&bytes)?;
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["build"], build_sha());
        assert_eq!(payload["metrics"]["webhooks_updated"], 0);
        Ok(())
    }

    #[tokio::test]
    async fn metrics_expose_route_counters() -> Result<()> {
        let harness = harness("http://127.0.0.1:1")?;
        let health_request = Request::builder().uri(ROUTE_HEALTH).body(Body::empty())?;
        harness.server.router().clone().oneshot(health_request).await?;

        let request = Request::builder().uri(ROUTE_METRICS).body(Body::empty())?;
        let response = harness.server.router().clone().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some(PROMETHEUS_CONTENT_TYPE)
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let text = String::from_utf8(bytes.to_vec())?;
        assert!(text.contains("http_requests_total"));
        assert!(text.contains("route=\"/health\""));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_paths_are_not_counted() -> Result<()> {
        let harness = harness("http://127.0.0.1:1")?;
        let request = Request::builder().uri("/wp-login.php").body(Body::empty())?;
        let response = harness.server.router().clone().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let text = harness.telemetry.render()?;
        assert!(!text.contains("wp-login"));
        Ok(())
    }

    #[tokio::test]
    async fn occupied_port_is_a_bind_failure() -> Result<()> {
        let taken = TcpListener::bind("127.0.0.1:0").await?;
        let addr = taken.local_addr()?;
        let harness = harness("http://127.0.0.1:1")?;

        let result = harness.server.serve(addr, async {}).await;
        assert!(matches!(result, Err(ApiServerError::Bind { addr: failed, .. }) if failed == addr));
        Ok(())
    }

    #[tokio::test]
    async fn request_id_is_minted_when_absent() -> Result<()> {
        let harness = harness("http://127.0.0.1:1")?;
        let request = Request::builder().uri(ROUTE_HEALTH).body(Body::empty())?;
        let response = harness.server.router().clone().oneshot(request).await?;

        let minted = response
            .headers()
            .get(HEADER_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        assert_eq!(minted.len(), 36);
        Ok(())
    }
}
