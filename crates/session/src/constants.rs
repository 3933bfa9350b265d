//! Nutrient tracker API session constants
//!
//! Paths and signatures of the backend's cookie-based session endpoints.
//! All are overridable from config; these are the values the production
//! backend uses.

/// Login endpoint (urlencoded `username` + `password`, sets both cookies)
pub const LOGIN_PATH: &str = "/token";

/// Exchanges the refresh cookie for a new access cookie. No body.
pub const REFRESH_PATH: &str = "/refresh_token";

/// Clears both session cookies
pub const LOGOUT_PATH: &str = "/logout";

/// The only status the refresh endpoint answers with on success.
pub const REFRESH_SUCCESS_STATUS: u16 = 200;

/// Server `detail` for an expired access cookie, matched exactly.
///
/// Other 401/403 details ("Incorrect username or password", "Could not
/// validate credentials...") must pass through untouched.
pub const EXPIRED_ACCESS_DETAIL: &str = "Access token expired. Please refresh or login.";

/// Statuses the backend uses for the expired-access response.
pub const EXPIRY_STATUSES: &[u16] = &[401, 403];

/// Upper bound on one refresh call before it counts as failed.
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 10;
