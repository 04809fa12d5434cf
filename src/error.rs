//! Task runtime error types.
//!
//! Errors are categorized by who has to act on them:
//!
//! | Category | Variants | Recovery |
//! |----------|----------|----------|
//! | **Caller contract** | `MissingObservable`, `TargetNotMeasured`, `UnsupportedResultType`, `UnknownDevice`, `InvalidShotCount`, `DivisionByZero`, `InvalidObservable`, `InvalidDeviceParameters` | Fix input |
//! | **Data shape** | `MissingMeasurementData`, `EmptySolutionSet`, `MalformedPayload` | Report to backend owner |
//! | **Backend** | `Backend`, `TaskNotFound`, `Storage`, `Decode` | Caller may retry |
//! | **Configuration** | `Configuration`, `Json` | Fix configuration |
//!
//! A poll timeout is not an error: [`crate::TaskHandle::fetch_result`]
//! returns `Ok(None)` when the wait expires.

use thiserror::Error;

/// Errors that can occur while building, tracking, or analysing a task.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TaskError {
    // ── Caller-contract violations ───────────────────────────────────
    /// A sample, expectation, or variance request has no observable.
    #[error("Result type {0} requires an observable")]
    MissingObservable(String),

    /// A requested target qubit was not measured.
    #[error("Target qubit {target} is not among the measured qubits {measured:?}")]
    TargetNotMeasured {
        /// The missing target.
        target: usize,
        /// The qubits that were measured.
        measured: Vec<usize>,
    },

    /// The result type cannot be computed from shot data.
    #[error("Unsupported result type: {0}")]
    UnsupportedResultType(String),

    /// No known provider marker matched the device ARN.
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    /// Shot count outside the range the device accepts.
    #[error("Invalid shot count {shots}: {reason}")]
    InvalidShotCount {
        /// Requested shots.
        shots: u64,
        /// Why the count was rejected.
        reason: String,
    },

    /// Probabilities requested over zero shots.
    #[error("Cannot compute probabilities over zero shots")]
    DivisionByZero,

    /// Observable descriptor is inconsistent with its targets.
    #[error("Invalid observable: {0}")]
    InvalidObservable(String),

    /// Device parameters do not fit the device or the task kind.
    #[error("Invalid device parameters: {0}")]
    InvalidDeviceParameters(String),

    // ── Data-shape violations from the backend ───────────────────────
    /// A shot-based gate-model result has neither outcomes nor probabilities.
    #[error("Result for task {0} contains neither measurements nor measurement probabilities")]
    MissingMeasurementData(String),

    /// An annealing result returned no solutions.
    #[error("Annealing result contains no solutions")]
    EmptySolutionSet,

    /// Payload fields are present but inconsistent.
    #[error("Malformed result payload: {0}")]
    MalformedPayload(String),

    // ── Backend errors ───────────────────────────────────────────────
    /// Error reported by the task service.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The task service does not know the identifier.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Result blob could not be retrieved.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Result blob could not be decoded.
    #[error("Failed to decode result payload: {0}")]
    Decode(String),

    // ── Configuration ────────────────────────────────────────────────
    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse grouping of [`TaskError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller passed something the core cannot work with.
    CallerContract,
    /// The backend returned a payload with an impossible shape.
    DataShape,
    /// Transport, storage, or service failure.
    Backend,
    /// Client configuration problem.
    Configuration,
}

impl TaskError {
    /// Category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingObservable(_)
            | Self::TargetNotMeasured { .. }
            | Self::UnsupportedResultType(_)
            | Self::UnknownDevice(_)
            | Self::InvalidShotCount { .. }
            | Self::DivisionByZero
            | Self::InvalidObservable(_)
            | Self::InvalidDeviceParameters(_) => ErrorCategory::CallerContract,
            Self::MissingMeasurementData(_)
            | Self::EmptySolutionSet
            | Self::MalformedPayload(_) => ErrorCategory::DataShape,
            Self::Backend(_) | Self::TaskNotFound(_) | Self::Storage(_) | Self::Decode(_) => {
                ErrorCategory::Backend
            }
            Self::Configuration(_) | Self::Json(_) => ErrorCategory::Configuration,
        }
    }

    /// Returns `true` if the operation may succeed when repeated.
    ///
    /// The runtime never retries on its own; this is a hint for callers.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Storage(_))
    }
}

/// Result type for task runtime operations.
pub type TaskResult<T> = Result<T, TaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            TaskError::MissingObservable("expectation".into()).category(),
            ErrorCategory::CallerContract
        );
        assert_eq!(
            TaskError::EmptySolutionSet.category(),
            ErrorCategory::DataShape
        );
        assert_eq!(
            TaskError::Storage("no such key".into()).category(),
            ErrorCategory::Backend
        );
        assert_eq!(
            TaskError::Configuration("bad".into()).category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_transient_errors() {
        assert!(TaskError::Backend("throttled".into()).is_transient());
        assert!(!TaskError::TaskNotFound("t-1".into()).is_transient());
        assert!(!TaskError::DivisionByZero.is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = TaskError::TargetNotMeasured {
            target: 3,
            measured: vec![0, 1],
        };
        assert_eq!(
            err.to_string(),
            "Target qubit 3 is not among the measured qubits [0, 1]"
        );
    }
}
