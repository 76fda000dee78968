//! Error types and handling for tou-rates
//!
//! Client failures are classified as authentication, connection or protocol
//! errors so the refresh loop can decide between keeping stale data and
//! failing the cycle.

use thiserror::Error;

/// Result type alias for tou-rates operations
pub type Result<T> = std::result::Result<T, TariffError>;

/// Main error type for tou-rates
#[derive(Debug, Error)]
pub enum TariffError {
    /// Rejected credential; never retried
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Network failure or timeout that survived every retry attempt
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Unexpected HTTP status or API-level error payload
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Internal failure while computing the current rate
    #[error("Resolution error: {message}")]
    Resolution { message: String },

    /// No rate can be produced because no schedule was ever cached
    #[error("Rate unavailable: {message}")]
    Unavailable { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl TariffError {
    /// Create a new authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        TariffError::Auth {
            message: message.into(),
        }
    }

    /// Create a new connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        TariffError::Connection {
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        TariffError::Protocol {
            message: message.into(),
        }
    }

    /// Create a new resolution error
    pub fn resolution<S: Into<String>>(message: S) -> Self {
        TariffError::Resolution {
            message: message.into(),
        }
    }

    /// Create a new unavailable error
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        TariffError::Unavailable {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        TariffError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        TariffError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        TariffError::Io {
            message: message.into(),
        }
    }

    /// Whether the client may retry the failed request
    pub fn is_retryable(&self) -> bool {
        matches!(self, TariffError::Connection { .. })
    }

    /// Whether this is a credential problem that setup callers must see
    pub fn is_auth(&self) -> bool {
        matches!(self, TariffError::Auth { .. })
    }
}

impl From<std::io::Error> for TariffError {
    fn from(err: std::io::Error) -> Self {
        TariffError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for TariffError {
    fn from(err: serde_yaml::Error) -> Self {
        TariffError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TariffError {
    fn from(err: serde_json::Error) -> Self {
        TariffError::Serialization {
            message: err.to_string(),
        }
    }
}
