//! Session recovery for the nutrient tracker API
//!
//! Access credentials are short-lived cookies. When one expires mid-session,
//! every request that hits the expiry waits on a single shared refresh and is
//! then replayed once, so callers never see the expiry itself.
//!
//! Request flow:
//! 1. Caller builds a `RequestDescriptor` and calls `Interceptor::execute()`
//! 2. The transport answers; anything but the expiry signature is returned as is
//! 3. On expiry, `RefreshCoordinator::await_refresh()` either starts the refresh
//!    (leader) or queues behind the one in flight
//! 4. When the cycle ends, every queued caller is released in arrival order
//! 5. Each caller replays its request once; a failed refresh is returned as
//!    `Error::Refresh` instead

pub mod constants;
pub mod coordinator;
pub mod endpoints;
pub mod error;
pub mod interceptor;
mod metrics;
pub mod signature;

#[cfg(test)]
mod testing;

pub use constants::*;
pub use coordinator::{RefreshCoordinator, RefreshPhase};
pub use endpoints::{Credentials, login, logout, refresh_request};
pub use error::{Error, RefreshError, Result};
pub use interceptor::Interceptor;
pub use signature::{ExpirySignature, FailureClass};
