//! Error types for the MedIntel core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire MedIntel workspace.
///
/// Every failure in the consultation core is scoped to the operation that
/// produced it; none of these variants is fatal to the process.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum MedintelError {
    /// The conferencing widget capability is not present in the host.
    #[error("Conferencing widget unavailable: {0}")]
    WidgetUnavailable(String),

    /// The backend answered with a non-success status code.
    #[error("HTTP error ({status}): {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (connect, timeout, body read).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {message}")]
    Io { message: String },

    /// The caller violated a precondition (e.g. out-of-range draft row).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A save for the same doctor/patient pair is still in flight.
    #[error("A prescription save is already in progress for patient '{patient_id}'")]
    SaveInFlight { patient_id: String },

    /// An operation needs an identity component the address did not carry.
    #[error("Missing identity: {0}")]
    MissingIdentity(&'static str),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MedintelError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a WidgetUnavailable error
    pub fn widget_unavailable(message: impl Into<String>) -> Self {
        Self::WidgetUnavailable(message.into())
    }

    /// Creates an Http error from a status code and response text
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Io error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a WidgetUnavailable error
    pub fn is_widget_unavailable(&self) -> bool {
        matches!(self, Self::WidgetUnavailable(_))
    }

    /// Check if the backend could not be reached or rejected the request.
    ///
    /// Returns true for `Http` and `Transport` errors, which are the two
    /// recoverable failure shapes of both backend endpoints.
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Transport(_))
    }

    /// Check if this is a SaveInFlight error
    pub fn is_save_in_flight(&self) -> bool {
        matches!(self, Self::SaveInFlight { .. })
    }

    /// Check if this is an InvalidInput error
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Check if this is an I/O error
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for MedintelError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MedintelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MedintelError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for MedintelError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (used at the binary boundary)
impl From<anyhow::Error> for MedintelError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, MedintelError>`.
pub type Result<T> = std::result::Result<T, MedintelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_failure_classification() {
        assert!(MedintelError::http(500, "boom").is_backend_failure());
        assert!(MedintelError::transport("connection refused").is_backend_failure());
        assert!(!MedintelError::invalid_input("row 3").is_backend_failure());
        assert!(!MedintelError::widget_unavailable("missing").is_backend_failure());
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let converted: MedintelError = err.into();
        match converted {
            MedintelError::Serialization { format, .. } => assert_eq!(format, "JSON"),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let converted = MedintelError::from(err);
        assert!(converted.is_io());
        assert!(converted.to_string().contains("PermissionDenied"));
    }

    #[test]
    fn test_display_includes_status() {
        let err = MedintelError::http(503, "Service Unavailable");
        assert_eq!(err.to_string(), "HTTP error (503): Service Unavailable");
    }
}
