//! Single-flight refresh of the access credential
//!
//! However many requests discover an expired credential at the same moment,
//! one refresh call is made. The first caller becomes the leader and sends
//! it; everyone arriving while it is in flight is queued and released in
//! arrival order with the leader's outcome.
//!
//! States: `Idle` → `Refreshing { waiters }` → `Idle`. The transition and the
//! queue drain happen under one mutex, so a new cycle can never start while a
//! previous cycle still has queued callers. The lock is never held across an
//! await.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use transport::Transport;

use crate::constants::REFRESH_SUCCESS_STATUS;
use crate::endpoints::refresh_request;
use crate::error::RefreshError;
use crate::metrics;

/// Completion handle for one queued caller. Completed exactly once.
type Deferred = oneshot::Sender<Result<(), RefreshError>>;

/// Observable coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Refreshing { waiters: usize },
}

impl RefreshPhase {
    /// Status label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            RefreshPhase::Idle => "idle",
            RefreshPhase::Refreshing { .. } => "refreshing",
        }
    }
}

/// Invariant: `waiters` is empty whenever `in_progress` is false.
#[derive(Default)]
struct RefreshState {
    in_progress: bool,
    waiters: VecDeque<Deferred>,
}

/// Owns the process-wide refresh state machine.
pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    refresh_path: String,
    timeout: Duration,
    state: Mutex<RefreshState>,
    cycles: AtomicU64,
}

impl RefreshCoordinator {
    /// `refresh_path` is sent directly on `transport`, never through the
    /// interceptor, so an expired response from the refresh endpoint itself
    /// ends the cycle instead of queueing the leader behind itself.
    pub fn new(
        transport: Arc<dyn Transport>,
        refresh_path: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            refresh_path: refresh_path.into(),
            timeout,
            state: Mutex::new(RefreshState::default()),
            cycles: AtomicU64::new(0),
        }
    }

    pub fn phase(&self) -> RefreshPhase {
        let state = self.state.lock();
        if state.in_progress {
            RefreshPhase::Refreshing {
                waiters: state.waiters.len(),
            }
        } else {
            RefreshPhase::Idle
        }
    }

    /// Refresh calls issued since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Wait until a refreshed credential is available, or the refresh failed.
    ///
    /// Starts a refresh if none is in flight; otherwise joins the current one.
    pub async fn await_refresh(&self) -> Result<(), RefreshError> {
        let queued = {
            let mut state = self.state.lock();
            if state.in_progress {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                debug!(
                    position = state.waiters.len(),
                    "refresh in flight, queued behind leader"
                );
                Some(rx)
            } else {
                state.in_progress = true;
                None
            }
        };

        if let Some(rx) = queued {
            // A dropped sender means the cycle ended without settling us
            return rx.await.unwrap_or(Err(RefreshError::Abandoned));
        }

        let mut cycle = CycleGuard {
            coordinator: self,
            settled: false,
        };
        let result = self.refresh_once().await;
        cycle.settle(&result);
        result
    }

    /// The leader's single refresh attempt. Not retried.
    async fn refresh_once(&self) -> Result<(), RefreshError> {
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let request = refresh_request(&self.refresh_path);
        info!(cycle, request_id = request.id(), "refreshing access credential");

        let result = match tokio::time::timeout(self.timeout, self.transport.send(&request)).await
        {
            Err(_) => Err(RefreshError::TimedOut(self.timeout)),
            Ok(Err(e)) => Err(RefreshError::from(e)),
            Ok(Ok(response)) if response.status == REFRESH_SUCCESS_STATUS => Ok(()),
            Ok(Ok(response)) => Err(RefreshError::Rejected {
                status: response.status,
                message: format!("expected {REFRESH_SUCCESS_STATUS}: {}", response.text()),
            }),
        };

        match &result {
            Ok(()) => info!(cycle, "access credential refreshed"),
            Err(e) => warn!(cycle, error = %e, "access credential refresh failed"),
        }
        result
    }

    /// Release every queued caller in FIFO order with `result`, then go idle.
    ///
    /// Runs under the state lock; sending on a oneshot never blocks.
    fn drain(&self, result: &Result<(), RefreshError>) -> usize {
        let mut state = self.state.lock();
        let released = state.waiters.len();
        while let Some(waiter) = state.waiters.pop_front() {
            // Err means that caller was cancelled while queued
            let _ = waiter.send(result.clone());
        }
        state.in_progress = false;
        released
    }
}

/// Ends the leader's cycle even if the leader's future is dropped mid-refresh.
struct CycleGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl CycleGuard<'_> {
    fn settle(&mut self, result: &Result<(), RefreshError>) {
        let released = self.coordinator.drain(result);
        self.settled = true;
        debug!(released, "refresh waiters released");
        metrics::record_refresh(result, released);
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("refresh leader cancelled, failing queued callers");
            self.settle(&Err(RefreshError::Abandoned));
        }
    }
}
