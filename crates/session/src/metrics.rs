//! Session recovery metrics
//!
//! - `session_refresh_total` (counter): label `outcome`
//! - `session_refresh_waiters` (histogram): callers released per refresh cycle
//! - `session_replays_total` (counter): label `outcome`
//!
//! Calls are no-ops until the binary installs a recorder.

use crate::error::RefreshError;

/// Outcome label for a finished refresh cycle.
pub(crate) fn refresh_outcome(result: &Result<(), RefreshError>) -> &'static str {
    match result {
        Ok(()) => "success",
        Err(RefreshError::Rejected { .. }) => "rejected",
        Err(RefreshError::Transport(_)) => "transport",
        Err(RefreshError::TimedOut(_)) => "timeout",
        Err(RefreshError::Abandoned) => "abandoned",
    }
}

/// Record a finished refresh cycle and how many queued callers it released.
pub(crate) fn record_refresh(result: &Result<(), RefreshError>, waiters: usize) {
    metrics::counter!("session_refresh_total", "outcome" => refresh_outcome(result)).increment(1);
    metrics::histogram!("session_refresh_waiters").record(waiters as f64);
}

/// Record the outcome of replaying a request after a refresh.
pub(crate) fn record_replay(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("session_replays_total", "outcome" => outcome).increment(1);
}
