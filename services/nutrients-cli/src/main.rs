//! Nutrient tracker command-line client
//!
//! Single binary that:
//! 1. Loads the TOML config and resolves the password
//! 2. Logs in with the password form (when credentials are configured)
//! 3. Sends the requested call through the credential-recovering interceptor
//! 4. Prints the response body to stdout; logs go to stderr

mod cli;
mod config;
mod error;
mod metrics;

use anyhow::{Context, Result};
use session::{ExpirySignature, Interceptor, RefreshCoordinator};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::{HttpTransport, Response};

use crate::cli::Command;
use crate::config::Config;

/// Wire the HTTP transport, refresh coordinator and interceptor from config.
///
/// The coordinator shares the interceptor's transport, and with it the cookie
/// jar, so a refreshed cookie is visible to every replay.
fn build_interceptor(config: &Config) -> Result<Interceptor> {
    let transport = Arc::new(
        HttpTransport::new(&config.api.base_url, config.timeout(), &config.headers)
            .context("failed to build HTTP transport")?,
    );
    let coordinator = Arc::new(RefreshCoordinator::new(
        transport.clone(),
        config.session.refresh_path.clone(),
        config.session.refresh_timeout(),
    ));
    let signature = ExpirySignature::new(config.session.expiry_detail.clone());
    Ok(Interceptor::new(transport, coordinator, signature))
}

/// Run one command: log in if configured, execute, optionally log out.
async fn run(config: &Config, interceptor: &Interceptor, command: &Command) -> Result<Response> {
    let credentials = config.session.credentials();
    if let Some(credentials) = &credentials {
        session::login(interceptor, &config.session.login_path, credentials)
            .await
            .with_context(|| format!("login as {} failed", credentials.username))?;
    }

    let result = match command.descriptor() {
        Some(request) => {
            let target = format!("{} {}", request.method(), request.path());
            interceptor
                .execute(request)
                .await
                .with_context(|| format!("{target} failed"))
        }
        None => session::logout(interceptor, &config.session.logout_path)
            .await
            .context("logout failed"),
    };

    if config.session.logout_on_exit && credentials.is_some() && *command != Command::Logout {
        if let Err(e) = session::logout(interceptor, &config.session.logout_path).await {
            warn!(error = %e, "logout on exit failed");
        }
    }

    result
}

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr with LOG_LEVEL / RUST_LOG support; stdout is for bodies
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let prometheus = metrics::install_recorder()?;

    let args = cli::parse(std::env::args().skip(1))
        .map_err(|e| anyhow::anyhow!("{e}\n{}", cli::USAGE))?;

    let config_path = Config::resolve_path(args.config.as_deref());
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        base_url = %config.api.base_url,
        login = config.session.username.is_some(),
        refresh_path = %config.session.refresh_path,
        headers = config.headers.len(),
        "configuration loaded"
    );

    let interceptor = build_interceptor(&config)?;
    let outcome = run(&config, &interceptor, &args.command).await;

    debug!(
        refresh_cycles = interceptor.coordinator().cycles(),
        metrics = %prometheus.render(),
        "session metrics"
    );

    let response = outcome?;
    println!("{}", response.text());
    Ok(())
}
