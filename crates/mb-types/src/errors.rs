use thiserror::Error;

/// Main error type for the Mobius system
#[derive(Error, Debug)]
pub enum MobiusError {
    #[error("Invalid thresholds: low {low} must be strictly below high {high}")]
    InvalidThresholds { low: f64, high: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MobiusError {
    /// Whether the error was caused by caller input rather than by the
    /// environment (file system, encoding).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidThresholds { .. } | Self::InvalidConfiguration(_) | Self::Validation(_)
        )
    }
}

/// Result type alias for Mobius operations
pub type MobiusResult<T> = Result<T, MobiusError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::MobiusError::Validation(format!($($arg)*))
    };
}

/// Macro for creating optimizer configuration errors
#[macro_export]
macro_rules! invalid_configuration {
    ($($arg:tt)*) => {
        $crate::MobiusError::InvalidConfiguration(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::MobiusError::Config(format!($($arg)*))
    };
}
