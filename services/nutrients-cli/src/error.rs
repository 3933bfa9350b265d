//! Command-line usage errors

use thiserror::Error;

/// Bad invocation. Everything past argument parsing is reported through
/// `anyhow` with context instead.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UsageError {
    #[error("missing command (expected `request` or `logout`)")]
    MissingCommand,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("--config requires a path")]
    MissingConfigPath,

    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("path must start with /, got: {0}")]
    InvalidPath(String),

    #[error("request body is not valid JSON: {0}")]
    InvalidBody(String),

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

/// Result alias using the usage error
pub type Result<T> = std::result::Result<T, UsageError>;
