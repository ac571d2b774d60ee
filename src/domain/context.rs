//! Error context extension trait
//!
//! Adds `.context()` / `.with_context()` to any `Result` whose error converts
//! into [`EtlError`], keeping the domain error type instead of erasing it
//! the way `anyhow::Context` would.
//!
//! # Examples
//!
//! ```rust
//! use deal_etl::domain::Result;
//! use deal_etl::domain::context::ResultExt;
//!
//! fn read_checkpoint(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
//! }
//! ```

use crate::domain::errors::EtlError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error (evaluated eagerly)
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error, computing it only on failure
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

/// The original variant is kept; only its message gains the context prefix.
impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<EtlError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| prefix(e.into(), context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| prefix(e.into(), f()))
    }
}

fn prefix(err: EtlError, context: impl std::fmt::Display) -> EtlError {
    match err {
        EtlError::Configuration(msg) => EtlError::Configuration(format!("{context}: {msg}")),
        EtlError::Sink(msg) => EtlError::Sink(format!("{context}: {msg}")),
        EtlError::State(msg) => EtlError::State(format!("{context}: {msg}")),
        EtlError::Validation(msg) => EtlError::Validation(format!("{context}: {msg}")),
        EtlError::Serialization(msg) => EtlError::Serialization(format!("{context}: {msg}")),
        EtlError::Io(msg) => EtlError::Io(format!("{context}: {msg}")),
        // Remote errors carry structured fields callers match on
        remote @ EtlError::Remote(_) => remote,
        other => EtlError::Other(format!("{context}: {other}")),
    }
}
