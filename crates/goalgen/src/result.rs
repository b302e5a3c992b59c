//! Result and error types for goalgen.

use crate::engine::EngineError;
use crate::state::RunState;
use thiserror::Error;

/// Result type for controller operations
pub type GenResult<T> = Result<T, GenError>;

/// Errors that can occur while driving a generation session
#[derive(Debug, Error)]
pub enum GenError {
    /// Caller supplied data that violates an invariant
    #[error("Validation failed: {message}")]
    Validation {
        /// Error message
        message: String,
    },

    /// Goals named by the caller are not in the catalog snapshot
    #[error("Unknown coverage goals: {}", goals.join(", "))]
    UnknownGoals {
        /// Offending goal identifiers
        goals: Vec<String>,
    },

    /// Operation invoked in a run state that does not allow it
    #[error("Cannot {operation} while {state}")]
    State {
        /// Rejected operation
        operation: &'static str,
        /// Run state at the time of the call
        state: RunState,
    },

    /// Controller was disposed
    #[error("Controller has been disposed")]
    Disposed,

    /// Transport to the generation engine failed
    #[error("Engine communication failed: {message}")]
    Communication {
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// CSV report error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl GenError {
    /// Create a validation error
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a state error for `operation` rejected in `state`
    #[must_use]
    pub fn state(operation: &'static str, state: RunState) -> Self {
        Self::State { operation, state }
    }

    /// True for both validation variants
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::UnknownGoals { .. })
    }

    /// True when the run state rejected the operation
    #[must_use]
    pub const fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// True when the controller was already disposed
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        matches!(self, Self::Disposed)
    }
}

impl From<EngineError> for GenError {
    fn from(err: EngineError) -> Self {
        Self::Communication {
            message: err.to_string(),
        }
    }
}
