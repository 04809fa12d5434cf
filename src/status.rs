//! Task lifecycle types.
//!
//! The task state machine:
//!
//! ```text
//!   Created ──→ Queued ──→ Running ──→ Completed
//!                 │           │
//!                 │           ├──→ Failed(reason)
//!                 │           │
//!                 └───────────┴──→ Cancelling ──→ Cancelled
//! ```
//!
//! **Invariants:**
//! - Terminal states (`Completed`, `Failed`, `Cancelled`) are permanent.
//! - A handle never replaces a cached terminal status with a non-terminal one.
//! - Results are only fetched once the status is `Completed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::input::OutputLocation;

/// Opaque task identifier assigned by the submission service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a new task ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Backend-reported status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Accepted but not yet queued.
    Created,
    /// Waiting for the device.
    Queued,
    /// Executing on the device.
    Running,
    /// Finished; results are available.
    Completed,
    /// Finished without results.
    Failed,
    /// Cancellation requested, not yet effective.
    Cancelling,
    /// Cancelled before completion.
    Cancelled,
}

impl TaskStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check if the task ended without a result.
    pub fn is_unsuccessful(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "CREATED",
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelling => "CANCELLING",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Metadata snapshot returned by the status service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    /// Task identifier.
    pub id: TaskId,
    /// Current status.
    pub status: TaskStatus,
    /// Why the task failed, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Where the device wrote its output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_location: Option<OutputLocation>,
    /// Device execution time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_duration_ms: Option<u64>,
    /// When the task was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the task reached a terminal state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl TaskMetadata {
    /// Metadata with only an id and a status.
    pub fn new(id: TaskId, status: TaskStatus) -> Self {
        Self {
            id,
            status,
            failure_reason: None,
            output_location: None,
            execution_duration_ms: None,
            created_at: None,
            ended_at: None,
        }
    }

    /// Set the failure reason.
    pub fn with_failure_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }

    /// Set the output location.
    pub fn with_output_location(mut self, location: OutputLocation) -> Self {
        self.output_location = Some(location);
        self
    }

    /// Set the execution duration.
    pub fn with_execution_duration_ms(mut self, ms: u64) -> Self {
        self.execution_duration_ms = Some(ms);
        self
    }
}

/// Whether a status lookup may answer from the handle's cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Use the cached snapshot if one exists.
    Cached,
    /// Always ask the status service.
    #[default]
    Fresh,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_terminal() {
        assert!(!TaskStatus::Created.is_terminal());
        assert!(!TaskStatus::Queued.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(!TaskStatus::Cancelling.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Completed.is_unsuccessful());
    }

    #[test]
    fn test_task_status_wire_names() {
        assert_eq!(TaskStatus::Cancelling.to_string(), "CANCELLING");
        let status: TaskStatus = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(status, TaskStatus::Completed);
        assert_eq!(
            serde_json::to_string(&TaskStatus::Queued).unwrap(),
            "\"QUEUED\""
        );
    }

    #[test]
    fn test_task_id_from() {
        let id: TaskId = "task-123".into();
        assert_eq!(id.as_str(), "task-123");
        assert_eq!(id.to_string(), "task-123");
    }

    #[test]
    fn test_metadata_deserialize_sparse() {
        let json = r#"{"id": "t-9", "status": "FAILED", "failure_reason": "device offline"}"#;
        let metadata: TaskMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.status, TaskStatus::Failed);
        assert_eq!(metadata.failure_reason.as_deref(), Some("device offline"));
        assert!(metadata.output_location.is_none());
    }
}
