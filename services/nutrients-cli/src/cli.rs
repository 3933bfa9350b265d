//! Argument parsing
//!
//! ```text
//! nutrients [--config PATH] request <METHOD> <PATH> [JSON_BODY]
//! nutrients [--config PATH] logout
//! ```

use serde_json::Value;
use transport::{Method, RequestDescriptor};

use crate::error::{Result, UsageError};

pub const USAGE: &str = "usage: nutrients [--config PATH] request <METHOD> <PATH> [JSON_BODY]\n       nutrients [--config PATH] logout";

#[derive(Debug, PartialEq)]
pub enum Command {
    /// Send one request through the interceptor and print the body.
    Request {
        method: Method,
        path: String,
        body: Option<Value>,
    },
    /// End the server-side session.
    Logout,
}

impl Command {
    /// Fresh descriptor for a `Request` command.
    pub fn descriptor(&self) -> Option<RequestDescriptor> {
        match self {
            Command::Request { method, path, body } => {
                let request = RequestDescriptor::new(method.clone(), path.clone());
                Some(match body {
                    Some(value) => request.with_json(value.clone()),
                    None => request,
                })
            }
            Command::Logout => None,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Args {
    pub config: Option<String>,
    pub command: Command,
}

/// Parse arguments, excluding the program name.
pub fn parse<I>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = String>,
{
    let mut config = None;
    let mut positional = Vec::new();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if arg == "--config" {
            config = Some(args.next().ok_or(UsageError::MissingConfigPath)?);
        } else if let Some(path) = arg.strip_prefix("--config=") {
            config = Some(path.to_string());
        } else {
            positional.push(arg);
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        None => return Err(UsageError::MissingCommand),
        Some("request") => parse_request(&mut positional)?,
        Some("logout") => Command::Logout,
        Some(other) => return Err(UsageError::UnknownCommand(other.to_string())),
    };

    if let Some(extra) = positional.next() {
        return Err(UsageError::UnexpectedArgument(extra));
    }

    Ok(Args { config, command })
}

fn parse_request(args: &mut impl Iterator<Item = String>) -> Result<Command> {
    let method = args.next().ok_or(UsageError::MissingArgument("METHOD"))?;
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| UsageError::InvalidMethod(method))?;

    let path = args.next().ok_or(UsageError::MissingArgument("PATH"))?;
    if !path.starts_with('/') {
        return Err(UsageError::InvalidPath(path));
    }

    let body = args
        .next()
        .map(|raw| serde_json::from_str(&raw).map_err(|e| UsageError::InvalidBody(e.to_string())))
        .transpose()?;

    Ok(Command::Request { method, path, body })
}
