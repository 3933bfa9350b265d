//! Request transport for the nutrient tracker API
//!
//! Defines the `Transport` trait that the session layer sends every request
//! through, the `RequestDescriptor` value describing one call, and the
//! structured `TransportError` that keeps server error details verbatim.
//! `HttpTransport` is the reqwest-backed implementation; its cookie jar holds
//! the ambient session credential.

pub mod descriptor;
pub mod error;
pub mod http;

pub use descriptor::{AlreadyRetried, Body, RequestDescriptor};
pub use error::TransportError;
pub use http::{HeaderInjection, HttpTransport};
pub use reqwest::Method;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    /// Body as text, lossy on invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Outcome of a single send.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Performs one request and classifies the outcome.
///
/// Implementations must map every non-2xx status to `TransportError::Status`
/// with the server detail intact, and must not retry on their own: recovery
/// policy lives in the session layer.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    /// Identifier for logging (e.g. "http")
    fn id(&self) -> &str;

    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>>;
}
