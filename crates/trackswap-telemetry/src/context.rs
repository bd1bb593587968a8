//! Context propagation helpers for request and application spans.
//!
//! # Design
//! - Keeps the inbound request identifier in task-local storage so log lines
//!   emitted deep inside the relay pipeline can be correlated.
//! - Provides an application-level span guard carrying the build SHA.

use std::future::Future;
use std::sync::Arc;

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the application-level tracing span for the lifetime of the guard.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        let service = service.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("app", service = %service, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Retrieve the request identifier of the request being served, if any.
#[must_use]
pub fn current_request_id() -> Option<String> {
    ACTIVE_REQUEST_ID
        .try_with(|request_id| request_id.as_ref().to_string())
        .ok()
}

/// Execute the provided future with the supplied request identifier available
/// to [`current_request_id`].
pub async fn with_request_context<Fut, T>(request_id: impl Into<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    let request_id: Arc<str> = Arc::from(request_id.into());
    ACTIVE_REQUEST_ID.scope(request_id, fut).await
}

tokio::task_local! {
    static ACTIVE_REQUEST_ID: Arc<str>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_context_is_scoped_to_future() {
        assert!(current_request_id().is_none());
        let seen = with_request_context("req-1", async { current_request_id() }).await;
        assert_eq!(seen.as_deref(), Some("req-1"));
        assert!(current_request_id().is_none());
    }

    #[test]
    fn global_context_guard_can_be_created() {
        let _guard = GlobalContextGuard::new("trackswap-test");
    }
}
