//! Error types for tee_log
//!
//! Construction of a logger is fail-fast: every problem found while validating
//! configuration or wiring sinks surfaces as a [`TeeLogError`]. Once a logger
//! exists, sink write failures never reach the caller (see `sinks::tee`).

use thiserror::Error;

/// Main error type for tee_log operations
#[derive(Error, Debug)]
pub enum TeeLogError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid log level name
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    /// Invalid output format name
    #[error("Invalid output format {0}, must be json or pretty")]
    InvalidFormat(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigFileMissing(String),

    /// Network sink could not be established
    #[error("Transport error: {0}")]
    TransportError(String),

    /// I/O errors
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    /// Serialization errors
    #[error("Serialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    /// TOML parsing errors
    #[error("TOML parsing error: {source}")]
    TomlError {
        #[from]
        source: toml::de::Error,
    },

    /// Environment / layered configuration errors
    #[error("Configuration source error: {source}")]
    ConfigSourceError {
        #[from]
        source: config::ConfigError,
    },

    /// Sink-related errors
    #[error("Sink error: {0}")]
    SinkError(String),
}

/// Result type alias for tee_log operations
pub type Result<T> = std::result::Result<T, TeeLogError>;

impl TeeLogError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::TransportError(msg.into())
    }

    /// Create a new sink error
    pub fn sink<S: Into<String>>(msg: S) -> Self {
        Self::SinkError(msg.into())
    }

    /// Whether this error was caused by the configuration rather than the environment
    pub fn is_config_error(&self) -> bool {
        self.category() == "config"
    }

    /// Get the error category for logging purposes
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConfigError(_)
            | Self::InvalidLogLevel(_)
            | Self::InvalidFormat(_)
            | Self::ConfigFileMissing(_)
            | Self::TomlError { .. }
            | Self::ConfigSourceError { .. } => "config",
            Self::TransportError(_) => "transport",
            Self::IoError { .. } => "io",
            Self::SerializationError { .. } => "serialization",
            Self::SinkError(_) => "sink",
        }
    }
}
