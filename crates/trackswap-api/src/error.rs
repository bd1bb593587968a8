//! Listener-level failures surfaced to the binary.
//!
//! Request-scoped failures never land here; they become problem responses in
//! [`crate::http::errors`].

use std::net::SocketAddr;

use thiserror::Error;

/// Result alias for [`ApiServerError`].
pub type ApiServerResult<T> = std::result::Result<T, ApiServerError>;

/// The HTTP listener could not start or stopped on its own.
#[derive(Debug, Error)]
pub enum ApiServerError {
    /// The socket could not be bound, usually because the port is taken.
    #[error("failed to bind api listener")]
    Bind {
        /// Address from the listener settings.
        addr: SocketAddr,
        /// Bind error.
        source: std::io::Error,
    },
    /// `axum::serve` returned an error before shutdown was requested.
    #[error("api server terminated unexpectedly")]
    Serve {
        /// Accept loop error.
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn bind_failure_keeps_address_and_cause() -> anyhow::Result<()> {
        let err = ApiServerError::Bind {
            addr: "127.0.0.1:8000".parse()?,
            source: io::Error::new(io::ErrorKind::AddrInUse, "busy"),
        };
        assert_eq!(err.to_string(), "failed to bind api listener");
        let cause = err.source().map(ToString::to_string);
        assert_eq!(cause.as_deref(), Some("busy"));
        assert!(matches!(err, ApiServerError::Bind { addr, .. } if addr.port() == 8000));
        Ok(())
    }
}
