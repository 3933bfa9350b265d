//! Credential-recovering request execution
//!
//! `Interceptor::execute` is the only way application code sends requests.
//! It behaves exactly like a direct transport call except for one failure
//! class: an expired access credential. That failure is recovered by waiting
//! on the shared refresh cycle and replaying the request once.

use std::sync::Arc;

use tracing::{debug, instrument, warn};
use transport::{RequestDescriptor, Response, Transport};

use crate::coordinator::RefreshCoordinator;
use crate::error::{Error, Result};
use crate::metrics;
use crate::signature::{ExpirySignature, FailureClass};

/// Wraps a transport with transparent single-retry credential recovery.
pub struct Interceptor {
    transport: Arc<dyn Transport>,
    coordinator: Arc<RefreshCoordinator>,
    signature: ExpirySignature,
}

impl Interceptor {
    pub fn new(
        transport: Arc<dyn Transport>,
        coordinator: Arc<RefreshCoordinator>,
        signature: ExpirySignature,
    ) -> Self {
        Self {
            transport,
            coordinator,
            signature,
        }
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Send `request`, recovering once from an expired access credential.
    ///
    /// - Success and every non-expiry failure are returned unchanged.
    /// - On expiry the request is marked retried, the caller waits for the
    ///   shared refresh, and the request is sent exactly once more. The
    ///   replay's outcome is returned whatever it is.
    /// - If the refresh fails, the refresh error is returned instead of the
    ///   original expiry.
    #[instrument(skip_all, fields(request_id = %request.id(), method = %request.method(), path = %request.path()))]
    pub async fn execute(&self, mut request: RequestDescriptor) -> Result<Response> {
        let failure = match self.transport.send(&request).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        let class = self.signature.classify(&failure);
        if request.is_retried() || class != FailureClass::Expired {
            debug!(?class, retried = request.is_retried(), error = %failure, "request failed, passing through");
            return Err(Error::Transport(failure));
        }

        request.mark_retried()?;
        debug!(
            phase = self.coordinator.phase().label(),
            "access credential expired, waiting for refresh"
        );

        if let Err(e) = self.coordinator.await_refresh().await {
            warn!(error = %e, "session could not be renewed");
            return Err(Error::Refresh(e));
        }

        let replay = self.transport.send(&request).await;
        metrics::record_replay(replay.is_ok());
        match replay {
            Ok(response) => {
                debug!(status = response.status, "replay succeeded");
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, "replay failed after refresh");
                Err(Error::Transport(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{EXPIRED_ACCESS_DETAIL, REFRESH_PATH};
    use crate::coordinator::RefreshPhase;
    use crate::error::RefreshError;
    use crate::testing::{RefreshBehavior, ScriptedTransport};
    use std::time::Duration;

    fn interceptor(transport: &Arc<ScriptedTransport>) -> Interceptor {
        let coordinator = Arc::new(RefreshCoordinator::new(
            transport.clone(),
            REFRESH_PATH,
            Duration::from_secs(10),
        ));
        Interceptor::new(transport.clone(), coordinator, ExpirySignature::default())
    }

    fn path_of(response: &Response) -> String {
        let body: serde_json::Value = response.json().unwrap();
        body["path"].as_str().unwrap().to_string()
    }

    #[tokio::test(start_paused = true)]
    async fn success_passes_through_without_refresh() {
        let transport = Arc::new(ScriptedTransport::new());
        let interceptor = interceptor(&transport);

        let response = interceptor
            .execute(RequestDescriptor::get("/users/me/"))
            .await
            .unwrap();
        assert_eq!(path_of(&response), "/users/me/");
        assert_eq!(transport.refresh_calls(), 0);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_request_is_refreshed_and_replayed() {
        let transport = Arc::new(ScriptedTransport::new());
        let interceptor = interceptor(&transport);
        transport.expire();

        let response = interceptor
            .execute(RequestDescriptor::get("/users/me/"))
            .await
            .unwrap();
        assert_eq!(path_of(&response), "/users/me/");
        assert_eq!(transport.refresh_calls(), 1);

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert!(!calls[0].retried);
        assert!(calls[1].retried, "replay must carry the retried marker");
    }

    #[tokio::test(start_paused = true)]
    async fn three_concurrent_expiries_share_one_refresh() {
        let transport = Arc::new(ScriptedTransport::new());
        let interceptor = interceptor(&transport);
        transport.expire();

        let (a, b, c) = tokio::join!(
            interceptor.execute(RequestDescriptor::get("/users/me/")),
            interceptor.execute(RequestDescriptor::put("/users_vitamins/")),
            interceptor.execute(RequestDescriptor::put("/users_minerals/")),
        );

        assert_eq!(path_of(&a.unwrap()), "/users/me/");
        assert_eq!(path_of(&b.unwrap()), "/users_vitamins/");
        assert_eq!(path_of(&c.unwrap()), "/users_minerals/");
        assert_eq!(transport.refresh_calls(), 1);
        assert_eq!(transport.replays(), 3);
        assert_eq!(interceptor.coordinator().phase(), RefreshPhase::Idle);
        assert_eq!(interceptor.coordinator().cycles(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn replay_that_expires_again_is_not_retried() {
        let transport = Arc::new(
            ScriptedTransport::new().with_behavior(RefreshBehavior::SucceedWithoutRenewal),
        );
        let interceptor = interceptor(&transport);
        transport.expire();

        let err = interceptor
            .execute(RequestDescriptor::get("/users/me/"))
            .await
            .unwrap_err();
        let failure = err.transport().expect("replay failure is a transport error");
        assert_eq!(failure.status(), Some(401));
        assert_eq!(failure.detail(), Some(EXPIRED_ACCESS_DETAIL));

        assert_eq!(transport.refresh_calls(), 1);
        assert_eq!(transport.calls().len(), 2, "one original send, one replay");
    }

    #[tokio::test(start_paused = true)]
    async fn other_auth_failures_pass_through() {
        let transport = Arc::new(ScriptedTransport::new());
        let interceptor = interceptor(&transport);

        let err = interceptor
            .execute(RequestDescriptor::get("/denied"))
            .await
            .unwrap_err();
        assert_eq!(err.transport().unwrap().detail(), Some("Invalid credentials"));
        assert_eq!(err.to_string(), "HTTP 401: Invalid credentials");
        assert_eq!(transport.refresh_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_pass_through() {
        let transport = Arc::new(ScriptedTransport::new());
        let interceptor = interceptor(&transport);

        let err = interceptor
            .execute(RequestDescriptor::get("/broken"))
            .await
            .unwrap_err();
        assert_eq!(err.transport().unwrap().status(), Some(500));
        assert_eq!(transport.refresh_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn already_retried_descriptor_is_not_recovered() {
        let transport = Arc::new(ScriptedTransport::new());
        let interceptor = interceptor(&transport);
        transport.expire();

        let mut request = RequestDescriptor::get("/users/me/");
        request.mark_retried().unwrap();
        let err = interceptor.execute(request).await.unwrap_err();

        assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
        assert_eq!(transport.refresh_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_surfaces_refresh_error_to_every_caller() {
        let transport = Arc::new(
            ScriptedTransport::new().with_behavior(RefreshBehavior::Reject(401, "Refresh token is invalid")),
        );
        let interceptor = interceptor(&transport);
        transport.expire();

        let (a, b) = tokio::join!(
            interceptor.execute(RequestDescriptor::get("/users/me/")),
            interceptor.execute(RequestDescriptor::patch("/users/")),
        );
        for result in [a, b] {
            let err = result.unwrap_err();
            assert!(
                matches!(err, Error::Refresh(RefreshError::Rejected { status: 401, .. })),
                "got: {err:?}"
            );
            assert!(err.to_string().starts_with("session could not be renewed"));
        }

        assert_eq!(transport.refresh_calls(), 1);
        assert_eq!(transport.replays(), 0, "nothing is replayed after a failed refresh");
        assert_eq!(interceptor.coordinator().phase(), RefreshPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn later_expiry_starts_a_new_cycle() {
        let transport = Arc::new(ScriptedTransport::new());
        let interceptor = interceptor(&transport);

        transport.expire();
        interceptor
            .execute(RequestDescriptor::get("/users/me/"))
            .await
            .unwrap();
        transport.expire();
        interceptor
            .execute(RequestDescriptor::get("/users/me/"))
            .await
            .unwrap();

        assert_eq!(transport.refresh_calls(), 2);
        assert_eq!(interceptor.coordinator().cycles(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_timeout_is_a_refresh_error() {
        let transport = Arc::new(ScriptedTransport::new().with_behavior(RefreshBehavior::Hang));
        let interceptor = interceptor(&transport);
        transport.expire();

        let err = interceptor
            .execute(RequestDescriptor::get("/users/me/"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::Refresh(RefreshError::TimedOut(_))),
            "got: {err:?}"
        );
        assert_eq!(interceptor.coordinator().phase(), RefreshPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_refresh_response_ends_the_cycle() {
        let transport = Arc::new(
            ScriptedTransport::new().with_behavior(RefreshBehavior::Reject(401, EXPIRED_ACCESS_DETAIL)),
        );
        let interceptor = interceptor(&transport);
        transport.expire();

        let (a, b, c) = tokio::join!(
            interceptor.execute(RequestDescriptor::get("/users/me/")),
            interceptor.execute(RequestDescriptor::get("/users_vitamins/")),
            interceptor.execute(RequestDescriptor::get("/users_minerals/")),
        );
        for result in [a, b, c] {
            let err = result.unwrap_err();
            assert!(
                matches!(err, Error::Refresh(RefreshError::Rejected { status: 401, .. })),
                "got: {err:?}"
            );
        }
        assert_eq!(transport.refresh_calls(), 1);
        assert_eq!(interceptor.coordinator().phase(), RefreshPhase::Idle);
    }
}
