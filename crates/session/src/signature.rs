//! Expired-credential detection
//!
//! Only one failure shape is recoverable: a 401/403 whose `detail` is exactly
//! the backend's expired-access message. Every other auth failure (wrong
//! password, missing cookie, forbidden) passes through so the caller sees the
//! server's own message and no refresh loop can start from it.

use transport::TransportError;

use crate::constants::{EXPIRED_ACCESS_DETAIL, EXPIRY_STATUSES};

/// Classification of a failed send for recovery purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Access credential expired: refresh and replay once
    Expired,
    /// Some other 401/403: pass through
    AuthRejected,
    /// Everything else: pass through
    Other,
}

/// The exact status + detail pair identifying an expired access credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpirySignature {
    statuses: Vec<u16>,
    detail: String,
}

impl Default for ExpirySignature {
    fn default() -> Self {
        Self::new(EXPIRED_ACCESS_DETAIL)
    }
}

impl ExpirySignature {
    /// Signature matching `detail` on the backend's expiry statuses (401, 403).
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            statuses: EXPIRY_STATUSES.to_vec(),
            detail: detail.into(),
        }
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Exact match on status and detail. No trimming, no case folding.
    pub fn matches(&self, err: &TransportError) -> bool {
        match (err.status(), err.detail()) {
            (Some(status), Some(detail)) => {
                self.statuses.contains(&status) && detail == self.detail
            }
            _ => false,
        }
    }

    pub fn classify(&self, err: &TransportError) -> FailureClass {
        if self.matches(err) {
            FailureClass::Expired
        } else if err.is_auth_failure() {
            FailureClass::AuthRejected
        } else {
            FailureClass::Other
        }
    }
}
