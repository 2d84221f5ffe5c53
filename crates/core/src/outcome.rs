//! Caller-facing outcome protocol.
//!
//! Every mutating operation on the system boundary answers with the same
//! triple: an optional result value, a human-readable message, and a
//! severity tag. CLI, GUI and tests all consume this one shape.

use crate::error::CoreError;

/// Severity tag attached to every boundary outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        write!(f, "{tag}")
    }
}

/// The uniform result triple of every boundary operation.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    /// Operation result, when the operation produced one.
    pub value: Option<T>,
    /// Human-readable description of what happened.
    pub message: String,
    pub severity: Severity,
}

impl<T> Outcome<T> {
    /// Successful outcome carrying a value.
    pub fn info(value: T, message: impl Into<String>) -> Self {
        Self {
            value: Some(value),
            message: message.into(),
            severity: Severity::Info,
        }
    }

    /// Successful outcome with nothing to return, e.g. calling next on an
    /// empty queue.
    pub fn info_empty(message: impl Into<String>) -> Self {
        Self {
            value: None,
            message: message.into(),
            severity: Severity::Info,
        }
    }

    /// Non-fatal outcome the caller should surface but may ignore.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            value: None,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    /// Failed outcome. The operation had no effect.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            value: None,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Whether the operation was rejected.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl<T> From<CoreError> for Outcome<T> {
    fn from(err: CoreError) -> Self {
        Self {
            value: None,
            message: err.to_string(),
            severity: err.severity(),
        }
    }
}
