//! In-memory backend for session tests.
//!
//! Models the credential as a generation number: the "server" accepts only
//! the current generation, `expire()` bumps it, and a successful refresh
//! copies it to the "client". No sockets, so concurrency tests are
//! deterministic under paused time.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use transport::{RequestDescriptor, Response, Transport, TransportError};

use crate::constants::{EXPIRED_ACCESS_DETAIL, REFRESH_PATH};

#[derive(Debug, Clone)]
pub(crate) enum RefreshBehavior {
    /// 200 and renew the client credential
    Succeed,
    /// 200 without renewing, so replays expire again
    SucceedWithoutRenewal,
    /// A 2xx other than 200
    SucceedWithStatus(u16),
    Reject(u16, &'static str),
    /// Never answer
    Hang,
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub path: String,
    pub retried: bool,
}

pub(crate) struct ScriptedTransport {
    refresh_delay: Duration,
    behavior: Mutex<RefreshBehavior>,
    server_generation: AtomicU64,
    client_generation: AtomicU64,
    refresh_calls: AtomicUsize,
    calls: Mutex<Vec<Call>>,
}

fn json_response(status: u16, body: serde_json::Value) -> Response {
    Response {
        status,
        headers: Default::default(),
        body: body.to_string().into_bytes().into(),
    }
}

pub(crate) fn status_error(status: u16, detail: &str) -> TransportError {
    TransportError::from_response(status, serde_json::json!({ "detail": detail }).to_string().as_bytes())
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            refresh_delay: Duration::from_millis(50),
            behavior: Mutex::new(RefreshBehavior::Succeed),
            server_generation: AtomicU64::new(1),
            client_generation: AtomicU64::new(1),
            refresh_calls: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn with_behavior(self, behavior: RefreshBehavior) -> Self {
        *self.behavior.lock() = behavior;
        self
    }

    pub fn set_behavior(&self, behavior: RefreshBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// Invalidate the client's current access credential.
    pub fn expire(&self) {
        self.server_generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Non-refresh calls sent with the retried marker set.
    pub fn replays(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.retried).count()
    }
}

impl Transport for ScriptedTransport {
    fn id(&self) -> &str {
        "scripted"
    }

    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = transport::Result<Response>> + Send + 'a>> {
        Box::pin(async move {
            if request.path() == REFRESH_PATH {
                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                let behavior = self.behavior.lock().clone();
                tokio::time::sleep(self.refresh_delay).await;
                return match behavior {
                    RefreshBehavior::Succeed => {
                        let current = self.server_generation.load(Ordering::SeqCst);
                        self.client_generation.store(current, Ordering::SeqCst);
                        Ok(json_response(
                            200,
                            serde_json::json!({"message": "Access token refreshed successfully"}),
                        ))
                    }
                    RefreshBehavior::SucceedWithoutRenewal => {
                        Ok(json_response(200, serde_json::json!({})))
                    }
                    RefreshBehavior::SucceedWithStatus(status) => {
                        Ok(json_response(status, serde_json::json!({})))
                    }
                    RefreshBehavior::Reject(status, detail) => Err(status_error(status, detail)),
                    RefreshBehavior::Hang => std::future::pending().await,
                };
            }

            self.calls.lock().push(Call {
                path: request.path().to_string(),
                retried: request.is_retried(),
            });

            match request.path() {
                "/denied" => return Err(status_error(401, "Invalid credentials")),
                "/broken" => return Err(status_error(500, "Internal Server Error")),
                _ => {}
            }

            let server = self.server_generation.load(Ordering::SeqCst);
            let client = self.client_generation.load(Ordering::SeqCst);
            if server != client {
                return Err(status_error(401, EXPIRED_ACCESS_DETAIL));
            }
            Ok(json_response(
                200,
                serde_json::json!({ "path": request.path() }),
            ))
        })
    }
}
