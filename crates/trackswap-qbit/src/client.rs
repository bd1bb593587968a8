//! HTTP client and per-request session for the qBittorrent Web API.
//!
//! # Design
//! - One `reqwest::Client` (and its connection pool) is shared process-wide.
//! - Every login yields a fresh [`QbSession`] holding its own `SID` cookie, so
//!   concurrent webhook deliveries never share authentication state.
//! - No retries; callers decide how each failure maps onto their responses.

use std::time::Duration;

use reqwest::header::{COOKIE, HeaderMap, HeaderValue, SET_COOKIE};
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;
use url::Url;

use crate::error::{QbError, QbResult};
use crate::models::{TorrentInfo, TrackerEntry};

/// Body qBittorrent returns when a login succeeds.
pub const LOGIN_ACK: &str = "Ok.";

const ENDPOINT_LOGIN: &str = "auth/login";
const ENDPOINT_TORRENTS_INFO: &str = "torrents/info";
const ENDPOINT_TRACKERS: &str = "torrents/trackers";
const ENDPOINT_EDIT_TRACKER: &str = "torrents/editTracker";

/// Credentials and transport for one qBittorrent instance.
#[derive(Clone)]
pub struct QbClient {
    http: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl QbClient {
    /// Build a client with its own connection pool and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`QbError::ClientBuild`] if the TLS backend cannot be initialised.
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> QbResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| QbError::ClientBuild { source })?;
        Ok(Self::with_http_client(http, base_url, username, password))
    }

    /// Wrap an existing HTTP client.
    #[must_use]
    pub fn with_http_client(
        http: Client,
        base_url: Url,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Web UI base URL this client talks to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Authenticate with `POST /api/v2/auth/login`.
    ///
    /// The login only counts as successful when the response is a 2xx whose
    /// body is exactly [`LOGIN_ACK`]; qBittorrent answers `Fails.` with a 200
    /// on bad credentials.
    ///
    /// # Errors
    ///
    /// Returns [`QbError::Transport`], [`QbError::Status`] or
    /// [`QbError::LoginRejected`] when the login does not succeed.
    pub async fn login(&self) -> QbResult<QbSession<'_>> {
        let url = self.endpoint(ENDPOINT_LOGIN)?;
        let request = self.http.post(url).form(&[
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ]);
        let response = send(request, ENDPOINT_LOGIN).await?;
        let cookie = session_cookie(response.headers())?;
        let body = response.text().await.map_err(|source| QbError::Decode {
            endpoint: ENDPOINT_LOGIN,
            source,
        })?;
        if body != LOGIN_ACK {
            return Err(QbError::LoginRejected { body });
        }

        debug!(has_cookie = cookie.is_some(), "qBittorrent login accepted");
        Ok(QbSession {
            client: self,
            cookie,
        })
    }

    fn endpoint(&self, path: &'static str) -> QbResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/api/v2/{path}")).map_err(|source| QbError::InvalidUrl {
            endpoint: path,
            source,
        })
    }
}

/// Authenticated session scoped to a single webhook delivery.
pub struct QbSession<'a> {
    client: &'a QbClient,
    cookie: Option<HeaderValue>,
}

impl QbSession<'_> {
    /// Look up a torrent by info-hash via `GET /api/v2/torrents/info?hashes=`.
    ///
    /// Returns `Ok(None)` when qBittorrent knows no torrent with that hash.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails, the status is not 2xx, or the
    /// body is not a torrent list.
    pub async fn torrent_by_hash(&self, hash: &str) -> QbResult<Option<TorrentInfo>> {
        let url = self.client.endpoint(ENDPOINT_TORRENTS_INFO)?;
        let request = self.authorize(self.client.http.get(url).query(&[("hashes", hash)]));
        let response = send(request, ENDPOINT_TORRENTS_INFO).await?;
        let torrents: Vec<TorrentInfo> =
            response.json().await.map_err(|source| QbError::Decode {
                endpoint: ENDPOINT_TORRENTS_INFO,
                source,
            })?;
        Ok(torrents.into_iter().next())
    }

    /// List a torrent's trackers via `GET /api/v2/torrents/trackers?hash=`.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails, the status is not 2xx, or the
    /// body is not a tracker list.
    pub async fn trackers(&self, hash: &str) -> QbResult<Vec<TrackerEntry>> {
        let url = self.client.endpoint(ENDPOINT_TRACKERS)?;
        let request = self.authorize(self.client.http.get(url).query(&[("hash", hash)]));
        let response = send(request, ENDPOINT_TRACKERS).await?;
        response.json().await.map_err(|source| QbError::Decode {
            endpoint: ENDPOINT_TRACKERS,
            source,
        })
    }

    /// Replace `orig_url` with `new_url` via `POST /api/v2/torrents/editTracker`.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails or the status is not 2xx
    /// (qBittorrent answers 409 when `new_url` already exists on the torrent).
    pub async fn edit_tracker(&self, hash: &str, orig_url: &str, new_url: &str) -> QbResult<()> {
        let url = self.client.endpoint(ENDPOINT_EDIT_TRACKER)?;
        let request = self.authorize(self.client.http.post(url).form(&[
            ("hash", hash),
            ("origUrl", orig_url),
            ("newUrl", new_url),
        ]));
        send(request, ENDPOINT_EDIT_TRACKER).await?;
        Ok(())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.cookie {
            Some(cookie) => request.header(COOKIE, cookie.clone()),
            None => request,
        }
    }
}

async fn send(request: RequestBuilder, endpoint: &'static str) -> QbResult<Response> {
    let response = request
        .send()
        .await
        .map_err(|source| QbError::Transport { endpoint, source })?;
    let status = response.status();
    if !status.is_success() {
        return Err(QbError::Status {
            endpoint,
            status: status.as_u16(),
        });
    }
    Ok(response)
}

/// Collapse every `Set-Cookie` header into a single `Cookie` header value.
fn session_cookie(headers: &HeaderMap) -> QbResult<Option<HeaderValue>> {
    let pairs: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| raw.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect();
    if pairs.is_empty() {
        return Ok(None);
    }
    HeaderValue::from_str(&pairs.join("; "))
        .map(Some)
        .map_err(|_| QbError::InvalidCookie)
}
