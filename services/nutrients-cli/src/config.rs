//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The password comes from NUTRIENTS_PASSWORD or `password_file`, never from
//! the TOML body, so the config file can be checked in.

use common::Secret;
use session::Credentials;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use transport::HeaderInjection;

/// Env var holding the login password. Wins over `password_file`.
pub const PASSWORD_ENV: &str = "NUTRIENTS_PASSWORD";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub headers: Vec<HeaderInjection>,
}

/// Backend location
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Login and credential recovery settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// No login is performed when absent.
    pub username: Option<String>,
    #[serde(skip)]
    pub password: Option<Secret<String>>,
    pub password_file: Option<PathBuf>,
    pub login_path: String,
    pub logout_path: String,
    pub refresh_path: String,
    pub expiry_detail: String,
    pub refresh_timeout_secs: u64,
    pub logout_on_exit: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            password_file: None,
            login_path: session::LOGIN_PATH.to_string(),
            logout_path: session::LOGOUT_PATH.to_string(),
            refresh_path: session::REFRESH_PATH.to_string(),
            expiry_detail: session::EXPIRED_ACCESS_DETAIL.to_string(),
            refresh_timeout_secs: session::DEFAULT_REFRESH_TIMEOUT_SECS,
            logout_on_exit: false,
        }
    }
}

impl SessionConfig {
    /// Login form credentials, when a username is configured.
    pub fn credentials(&self) -> Option<Credentials> {
        let username = self.username.clone()?;
        let password = self.password.clone()?;
        Some(Credentials { username, password })
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file, then resolve the password when a
    /// username is configured.
    ///
    /// Password resolution order:
    /// 1. NUTRIENTS_PASSWORD env var
    /// 2. password_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.validate()?;

        if config.session.username.is_none() {
            return Ok(config);
        }

        config.session.password =
            common::resolve_secret(PASSWORD_ENV, config.session.password_file.as_deref())?;

        if config.session.password.is_none() {
            return Err(common::Error::Config(format!(
                "session.username is set but no password was found in {PASSWORD_ENV} or session.password_file"
            )));
        }

        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "api.base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "api.timeout_secs must be greater than 0".into(),
            ));
        }

        if self.session.refresh_timeout_secs == 0 {
            return Err(common::Error::Config(
                "session.refresh_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.session.expiry_detail.trim().is_empty() {
            return Err(common::Error::Config(
                "session.expiry_detail must not be empty".into(),
            ));
        }

        for (field, path) in [
            ("session.login_path", &self.session.login_path),
            ("session.logout_path", &self.session.logout_path),
            ("session.refresh_path", &self.session.refresh_path),
        ] {
            if !path.starts_with('/') {
                return Err(common::Error::Config(format!(
                    "{field} must start with /, got: {path}"
                )));
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("nutrients.toml")
    }
}
