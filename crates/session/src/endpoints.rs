//! Session endpoint calls
//!
//! The backend keeps the session in two HttpOnly cookies:
//! 1. `login()` posts the password form; the server sets access + refresh cookies
//! 2. `refresh_request()` is what the coordinator sends when access expires
//! 3. `logout()` asks the server to clear both cookies
//!
//! Login and logout go through the interceptor like any other call, so a
//! wrong password comes back as the server's own 401.

use common::Secret;
use tracing::info;
use transport::{RequestDescriptor, Response};

use crate::error::Result;
use crate::interceptor::Interceptor;

/// Username and password for the login form.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Secret<String>,
}

/// The refresh call: a bare POST, the refresh cookie is ambient.
pub fn refresh_request(path: &str) -> RequestDescriptor {
    RequestDescriptor::post(path)
}

fn login_request(path: &str, credentials: &Credentials) -> RequestDescriptor {
    RequestDescriptor::post(path).with_form(vec![
        ("username".to_string(), credentials.username.clone()),
        ("password".to_string(), credentials.password.expose().clone()),
    ])
}

/// Log in with the password form. Sets the session cookies on success.
pub async fn login(
    interceptor: &Interceptor,
    path: &str,
    credentials: &Credentials,
) -> Result<Response> {
    let response = interceptor.execute(login_request(path, credentials)).await?;
    info!(username = %credentials.username, "logged in");
    Ok(response)
}

/// Log out. The server answers 401 when no session cookies are present.
pub async fn logout(interceptor: &Interceptor, path: &str) -> Result<Response> {
    let response = interceptor.execute(RequestDescriptor::post(path)).await?;
    info!("logged out");
    Ok(response)
}
