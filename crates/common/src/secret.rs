//! Redacting wrapper for passwords and other credentials

use std::fmt;
use std::path::Path;

use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Sensitive value. Prints as `[REDACTED]` and is zeroed on drop.
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the inner value. Keep the borrow short and never log it.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Resolve a secret string from an environment variable or a file.
///
/// The environment variable wins when set. Otherwise the file (if any) is read
/// and trimmed; a whitespace-only file yields `None`. An unreadable file is an
/// error even though the value is optional, so a typo in the path is loud.
pub fn resolve_secret(env_var: &str, file: Option<&Path>) -> Result<Option<Secret<String>>> {
    if let Ok(value) = std::env::var(env_var) {
        return Ok(Some(Secret::new(value)));
    }

    let Some(path) = file else {
        return Ok(None);
    };

    let mut contents = std::fs::read_to_string(path).map_err(|source| Error::SecretFile {
        path: path.to_path_buf(),
        source,
    })?;
    let trimmed = contents.trim().to_owned();
    contents.zeroize();

    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Secret::new(trimmed)))
    }
}
