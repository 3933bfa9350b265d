//! Transport error classification

/// Errors from sending a single request.
///
/// `Status` keeps the server-provided `detail` verbatim so callers can match
/// exact error signatures (e.g. an expired access credential versus a wrong
/// password, both of which arrive as 401).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        /// The `detail` string from a `{"detail": "..."}` error body, if any
        detail: Option<String>,
        /// `detail` when present, otherwise the raw body text
        message: String,
    },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// Build a `Status` error from a non-success response body.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_owned));
        let message = match &detail {
            Some(d) => d.clone(),
            None if body.is_empty() => String::from("<no body>"),
            None => String::from_utf8_lossy(body).into_owned(),
        };
        TransportError::Status {
            status,
            detail,
            message,
        }
    }

    /// HTTP status, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided error detail, verbatim.
    pub fn detail(&self) -> Option<&str> {
        match self {
            TransportError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// True for 401 and 403 responses.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}
