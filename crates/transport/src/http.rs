//! reqwest-backed transport
//!
//! Sends descriptors to `base_url + path` with a per-request timeout and the
//! configured header injections. The session credential lives in the client's
//! cookie jar: the server sets it on login/refresh and reqwest attaches it to
//! every later request, so nothing above this layer handles it.

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{Body, RequestDescriptor, Response, Result, Transport, TransportError};

/// Header added to every outbound request (name + value pair from config).
#[derive(Debug, Clone, Deserialize)]
pub struct HeaderInjection {
    pub name: String,
    pub value: String,
}

/// HTTP transport. The client's cookie jar keeps the session cookies.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    injected: HeaderMap,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration, headers: &[HeaderInjection]) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::new(Jar::default()))
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            injected: injection_headers(headers),
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

/// Validate configured injections once, at construction.
///
/// Invalid names or values are skipped with a warning. `cookie` is refused:
/// the jar owns it, and a static cookie would pin a stale credential.
fn injection_headers(injections: &[HeaderInjection]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for injection in injections {
        let name = match HeaderName::from_str(&injection.name) {
            Ok(n) => n,
            Err(e) => {
                warn!(header = %injection.name, error = %e, "skipping invalid header name");
                continue;
            }
        };
        if name == COOKIE {
            warn!(header = %injection.name, "refusing to inject cookie header");
            continue;
        }
        let value = match HeaderValue::from_str(&injection.value) {
            Ok(v) => v,
            Err(e) => {
                warn!(header = %injection.name, error = %e, "skipping invalid header value");
                continue;
            }
        };
        headers.insert(name, value);
    }
    headers
}

fn classify_reqwest_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(format!("no response within {}s: {err}", timeout.as_secs()))
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Http(err.to_string())
    }
}

impl Transport for HttpTransport {
    fn id(&self) -> &str {
        "http"
    }

    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>> {
        Box::pin(async move {
            // Descriptor headers win over injections
            let mut headers = self.injected.clone();
            for (name, value) in request.headers() {
                headers.insert(name.clone(), value.clone());
            }

            let builder = self
                .client
                .request(request.method().clone(), self.url_for(request.path()))
                .headers(headers)
                .timeout(self.timeout);
            let builder = match request.body() {
                Body::Empty => builder,
                Body::Json(value) => builder.json(value),
                Body::Form(fields) => builder.form(fields),
            };

            let response = builder
                .send()
                .await
                .map_err(|e| classify_reqwest_error(e, self.timeout))?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| classify_reqwest_error(e, self.timeout))?;

            debug!(
                request_id = request.id(),
                method = %request.method(),
                path = request.path(),
                status,
                "response received"
            );

            if !(200..300).contains(&status) {
                return Err(TransportError::from_response(status, &body));
            }
            Ok(Response {
                status,
                headers,
                body,
            })
        })
    }
}
