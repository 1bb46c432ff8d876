//! Error handling module for the CNC simulator
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Engine operations return these synchronously to the caller; nothing raised
//! by a `set`, timed override or sweep request is swallowed.

use thiserror::Error;

/// Main error type for the simulator
#[derive(Error, Debug)]
pub enum SimError {
    /// Value outside the variable's domain, or of the wrong type
    #[error("Domain error: {0}")]
    Domain(String),

    /// Negative or non-finite duration/delay
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// Zero, non-finite or non-progressing step in a range specification
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Name not registered in the variable store
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// IO errors (file operations, terminal, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Terminal/UI errors
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// State errors (mutex poisoning, engine already shut down)
    #[error("State error: {0}")]
    State(String),
}

/// Result type alias for simulator operations
pub type Result<T> = std::result::Result<T, SimError>;

// Convenient error constructors
impl SimError {
    /// Create a domain error
    pub fn domain(msg: impl Into<String>) -> Self {
        Self::Domain(msg.into())
    }

    /// Create an invalid duration error
    pub fn invalid_duration(msg: impl Into<String>) -> Self {
        Self::InvalidDuration(msg.into())
    }

    /// Create an invalid range error
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange(msg.into())
    }

    /// Create an unknown variable error
    pub fn unknown_variable(name: impl Into<String>) -> Self {
        Self::UnknownVariable(name.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a terminal error
    pub fn terminal(msg: impl Into<String>) -> Self {
        Self::Terminal(msg.into())
    }

    /// Create a state error
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// True for the errors an operator can cause with a bad request.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Domain(_)
                | Self::InvalidDuration(_)
                | Self::InvalidRange(_)
                | Self::UnknownVariable(_)
        )
    }
}

/// Map a poisoned lock into a state error
pub(crate) fn poisoned<T>(err: std::sync::PoisonError<T>) -> SimError {
    SimError::State(format!("Mutex poisoned: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::domain("'RUNNING' is not one of READY, STOPPED");
        assert_eq!(
            err.to_string(),
            "Domain error: 'RUNNING' is not one of READY, STOPPED"
        );

        let err = SimError::unknown_variable("c9");
        assert_eq!(err.to_string(), "Unknown variable: c9");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SimError = io_err.into();
        assert!(matches!(err, SimError::Io(_)));
    }

    #[test]
    fn test_user_error_classification() {
        assert!(SimError::invalid_duration("-1").is_user_error());
        assert!(SimError::invalid_range("step is zero").is_user_error());
        assert!(!SimError::state("engine is shut down").is_user_error());
        assert!(!SimError::config("empty catalogue").is_user_error());
    }
}
