//! Types shared by the nutrient tracker client crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::{Secret, resolve_secret};
