//! Collaborator traits.
//!
//! The runtime talks to the outside world through these seams:
//!
//! | Trait | Kind | Role |
//! |-------|------|------|
//! | [`TaskService`] | async | submit, status, cancel |
//! | [`ResultStore`] | async | fetch the raw result blob |
//! | [`ResultDecoder`] | sync | bytes to [`RawResultPayload`] |
//! | [`EventSink`] | sync | lifecycle notifications |
//!
//! Transport, authentication and device discovery live behind
//! implementations of these traits.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{TaskError, TaskResult};
use crate::event::{EventSink, NoopEventSink};
use crate::input::{OutputLocation, SubmissionContext, SubmissionEnvelope};
use crate::payload::RawResultPayload;
use crate::status::{TaskId, TaskMetadata, TaskStatus};

/// Remote task service.
///
/// # Contract
///
/// - `submit()` returns the identifier the service assigned.
/// - `get_metadata()` returns the current snapshot; it never blocks on
///   the task reaching a particular state.
/// - `cancel()` requests cancellation and returns immediately with the
///   status the service reports for the request.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Submit an envelope.
    async fn submit(
        &self,
        envelope: &SubmissionEnvelope,
        context: &SubmissionContext,
    ) -> TaskResult<TaskId>;

    /// Fetch the current metadata of a task.
    async fn get_metadata(&self, task_id: &TaskId) -> TaskResult<TaskMetadata>;

    /// Request cancellation of a task.
    async fn cancel(&self, task_id: &TaskId) -> TaskResult<TaskStatus>;
}

/// Object storage holding result blobs.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Read the result blob in `location`.
    async fn fetch_blob(&self, location: &OutputLocation) -> TaskResult<Vec<u8>>;
}

/// Decoder from result blobs to typed payloads.
pub trait ResultDecoder: Send + Sync {
    /// Decode a blob.
    fn decode(&self, bytes: &[u8]) -> TaskResult<RawResultPayload>;
}

/// Decodes blobs written as tagged JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResultDecoder;

impl ResultDecoder for JsonResultDecoder {
    fn decode(&self, bytes: &[u8]) -> TaskResult<RawResultPayload> {
        serde_json::from_slice(bytes).map_err(|e| TaskError::Decode(e.to_string()))
    }
}

/// The collaborators a task handle needs, bundled for sharing.
#[derive(Clone)]
pub struct TaskServices {
    /// Submission, status and cancellation.
    pub tasks: Arc<dyn TaskService>,
    /// Result blob storage.
    pub store: Arc<dyn ResultStore>,
    /// Result blob decoder.
    pub decoder: Arc<dyn ResultDecoder>,
    /// Event sink.
    pub events: Arc<dyn EventSink>,
}

impl TaskServices {
    /// Bundle a task service and a store with the JSON decoder and no events.
    pub fn new(tasks: Arc<dyn TaskService>, store: Arc<dyn ResultStore>) -> Self {
        Self {
            tasks,
            store,
            decoder: Arc::new(JsonResultDecoder),
            events: Arc::new(NoopEventSink),
        }
    }

    /// Replace the decoder.
    pub fn with_decoder(mut self, decoder: Arc<dyn ResultDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Replace the event sink.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }
}

impl std::fmt::Debug for TaskServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskServices").finish_non_exhaustive()
    }
}
