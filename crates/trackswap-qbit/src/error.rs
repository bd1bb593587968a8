//! # Design
//!
//! - One error type for every qBittorrent API call.
//! - Keep error messages constant; capture the endpoint and status in fields.

use thiserror::Error;

/// Result alias for qBittorrent client operations.
pub type QbResult<T> = Result<T, QbError>;

/// Errors raised while talking to the qBittorrent Web API.
#[derive(Debug, Error)]
pub enum QbError {
    /// Building the shared HTTP client failed.
    #[error("failed to build http client")]
    ClientBuild {
        /// Source HTTP client error.
        source: reqwest::Error,
    },
    /// Joining the base URL with an endpoint path failed.
    #[error("invalid qbittorrent endpoint url")]
    InvalidUrl {
        /// Endpoint path that could not be joined.
        endpoint: &'static str,
        /// Source URL parse error.
        source: url::ParseError,
    },
    /// The request never produced a response.
    #[error("qbittorrent request failed")]
    Transport {
        /// Endpoint path used for the request.
        endpoint: &'static str,
        /// Source HTTP client error.
        source: reqwest::Error,
    },
    /// The API answered with a non-success status.
    #[error("qbittorrent returned an error status")]
    Status {
        /// Endpoint path used for the request.
        endpoint: &'static str,
        /// HTTP status code returned by the server.
        status: u16,
    },
    /// The response body could not be decoded.
    #[error("qbittorrent response could not be decoded")]
    Decode {
        /// Endpoint path used for the request.
        endpoint: &'static str,
        /// Source HTTP client error.
        source: reqwest::Error,
    },
    /// The login endpoint answered without the expected acknowledgment.
    #[error("qbittorrent rejected the login")]
    LoginRejected {
        /// Body returned instead of the acknowledgment.
        body: String,
    },
    /// A session cookie could not be turned into a request header.
    #[error("qbittorrent issued an unusable session cookie")]
    InvalidCookie,
}

impl QbError {
    /// Endpoint associated with the failure, when one applies.
    #[must_use]
    pub const fn endpoint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidUrl { endpoint, .. }
            | Self::Transport { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::Decode { endpoint, .. } => Some(*endpoint),
            Self::ClientBuild { .. } | Self::LoginRejected { .. } | Self::InvalidCookie => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qb_error_messages_and_endpoints() {
        let status = QbError::Status {
            endpoint: "torrents/info",
            status: 403,
        };
        assert_eq!(status.to_string(), "qbittorrent returned an error status");
        assert_eq!(status.endpoint(), Some("torrents/info"));

        let rejected = QbError::LoginRejected {
            body: "Fails.".to_string(),
        };
        assert_eq!(rejected.to_string(), "qbittorrent rejected the login");
        assert_eq!(rejected.endpoint(), None);
    }
}
