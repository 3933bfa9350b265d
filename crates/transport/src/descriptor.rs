//! Outbound request descriptors
//!
//! A `RequestDescriptor` is created fresh for every call and owned by that
//! call until it completes. The only mutation after construction is the
//! one-shot `retried` marker, which caps credential-recovery replays at one.

use std::fmt;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Raised when a descriptor is marked retried a second time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("request {request_id} was already retried")]
pub struct AlreadyRetried {
    pub request_id: String,
}

/// Request payload.
#[derive(Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded` fields, in order.
    Form(Vec<(String, String)>),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Json(value) => f.debug_tuple("Json").field(value).finish(),
            // Form bodies carry login passwords: names only.
            Body::Form(fields) => f
                .debug_tuple("Form")
                .field(&fields.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// One outbound call.
#[derive(Debug)]
pub struct RequestDescriptor {
    id: String,
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Body,
    retried: bool,
}

impl RequestDescriptor {
    /// Create a descriptor for `path`, relative to the transport's base URL.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: format!("req_{}", uuid::Uuid::new_v4().as_simple()),
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Body::Empty,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_json(mut self, value: serde_json::Value) -> Self {
        self.body = Body::Json(value);
        self
    }

    pub fn with_form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = Body::Form(fields);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Correlation id (`req_<uuid>`), used in log fields.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// Flip the retried marker. Fails if it was already set.
    pub fn mark_retried(&mut self) -> Result<(), AlreadyRetried> {
        if self.retried {
            return Err(AlreadyRetried {
                request_id: self.id.clone(),
            });
        }
        self.retried = true;
        Ok(())
    }
}
