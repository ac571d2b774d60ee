//! Domain error types
//!
//! This module defines the error hierarchy for deal-etl.
//! All errors are domain-specific and don't expose third-party types.
//!
//! Checkpoint persistence failures live in [`CheckpointWriteError`], which has
//! no conversion into [`EtlError`]: a failed checkpoint write can be logged but
//! can never become the failure of an extraction run.

use thiserror::Error;

/// Main deal-etl error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Configuration-related errors (missing token, invalid settings)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Remote API errors that survived the client's retry budget
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Downstream sink rejected a record
    #[error("Sink error: {0}")]
    Sink(String),

    /// Checkpoint store read errors
    #[error("State management error: {0}")]
    State(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// HubSpot API errors
///
/// Errors that occur when interacting with the CRM API after the client
/// has exhausted its retry policy. Rate-limit responses and transport blips
/// are recovered inside the client and never surface here unless retries ran out.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// All attempts failed
    #[error("Request failed after {attempts} attempts (status: {}): {message}", status.map(|s| s.to_string()).unwrap_or_else(|| "none".to_string()))]
    RetriesExhausted {
        attempts: u32,
        status: Option<u16>,
        message: String,
    },

    /// Rate limit waits exceeded the configured ceiling
    #[error("Rate limited by HubSpot API {waits} times in a row")]
    RateLimitExceeded { waits: u32 },

    /// Requested object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid response body
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// HTTP status of the last failed attempt, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RetriesExhausted { status, .. } => *status,
            Self::RateLimitExceeded { .. } => Some(429),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

/// Failure reported by a checkpoint sink
///
/// Returned only by [`crate::core::state::CheckpointSink`] implementations.
#[derive(Debug, Error)]
#[error("Failed to write checkpoint: {0}")]
pub struct CheckpointWriteError(pub String);

impl From<std::io::Error> for CheckpointWriteError {
    fn from(err: std::io::Error) -> Self {
        CheckpointWriteError(err.to_string())
    }
}

impl From<serde_json::Error> for CheckpointWriteError {
    fn from(err: serde_json::Error) -> Self {
        CheckpointWriteError(err.to_string())
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for EtlError {
    fn from(err: std::io::Error) -> Self {
        EtlError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for EtlError {
    fn from(err: serde_json::Error) -> Self {
        EtlError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for EtlError {
    fn from(err: toml::de::Error) -> Self {
        EtlError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etl_error_display() {
        let err = EtlError::Configuration("No access token found".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: No access token found"
        );
    }

    #[test]
    fn test_remote_error_conversion() {
        let remote = RemoteError::RateLimitExceeded { waits: 51 };
        let err: EtlError = remote.into();
        assert!(matches!(err, EtlError::Remote(_)));
    }

    #[test]
    fn test_retries_exhausted_display() {
        let err = RemoteError::RetriesExhausted {
            attempts: 3,
            status: Some(503),
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Request failed after 3 attempts (status: 503): Service Unavailable"
        );
        assert_eq!(err.status(), Some(503));

        let err = RemoteError::RetriesExhausted {
            attempts: 3,
            status: None,
            message: "connection reset".to_string(),
        };
        assert!(err.to_string().contains("status: none"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_checkpoint_write_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: CheckpointWriteError = io_err.into();
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: EtlError = io_err.into();
        assert!(matches!(err, EtlError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: EtlError = json_err.into();
        assert!(matches!(err, EtlError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: EtlError = toml_err.into();
        assert!(matches!(err, EtlError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
