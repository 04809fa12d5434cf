//! Lifecycle events.
//!
//! Sinks are fire-and-forget: a failed notification is logged and dropped,
//! never propagated into the operation that raised it.

use serde::Serialize;

use crate::error::TaskResult;
use crate::status::{TaskId, TaskStatus};

/// Something that happened to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TaskEvent {
    /// The submission service accepted the task.
    Submitted {
        /// Assigned identifier.
        task_id: TaskId,
        /// Target device.
        device_arn: String,
        /// Requested shots.
        shots: u64,
    },
    /// A fresh status fetch saw a different status than the cache.
    StatusChanged {
        /// Task identifier.
        task_id: TaskId,
        /// Previously cached status, if any.
        from: Option<TaskStatus>,
        /// New status.
        to: TaskStatus,
    },
    /// A structured result was produced and cached.
    Completed {
        /// Task identifier.
        task_id: TaskId,
        /// Device execution time, if reported.
        execution_duration_ms: Option<u64>,
    },
}

/// Receiver of [`TaskEvent`]s.
pub trait EventSink: Send + Sync {
    /// Deliver an event.
    fn notify(&self, event: &TaskEvent) -> TaskResult<()>;
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn notify(&self, _event: &TaskEvent) -> TaskResult<()> {
        Ok(())
    }
}

/// Deliver `event`, logging instead of failing.
pub(crate) fn emit(sink: &dyn EventSink, event: TaskEvent) {
    if let Err(err) = sink.notify(&event) {
        tracing::warn!(?event, error = %err, "event sink rejected notification");
    }
}
