//! Task handle and polling state machine.
//!
//! A [`TaskHandle`] owns one submitted task: its identifier, its polling
//! configuration and a write-once cache of metadata and result.
//!
//! ```text
//!   fetch_result()
//!     │
//!     ├── result cached ─────────────────────────→ Some(cached)
//!     ├── cached FAILED / CANCELLED ─────────────→ None
//!     ├── cached COMPLETED ──→ download ─────────→ Some(result)
//!     └── poll: refresh(Fresh), sleep(interval)
//!           ├── COMPLETED ──→ download ──────────→ Some(result)
//!           ├── FAILED / CANCELLED ──────────────→ None
//!           └── timeout or cancel token ─────────→ None
//! ```
//!
//! A handle is not meant to be shared: every method that touches the cache
//! takes `&mut self`. Distinct handles share nothing and can be polled
//! concurrently.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::instrument;

use crate::config::{ClientConfig, PollConfig};
use crate::device::ShotLimits;
use crate::error::{TaskError, TaskResult};
use crate::event::{TaskEvent, emit};
use crate::formatter::format_result;
use crate::input::{OutputLocation, SubmissionContext, TaskRequest, build_envelope};
use crate::result::StructuredResult;
use crate::service::TaskServices;
use crate::status::{CacheMode, TaskId, TaskMetadata, TaskStatus};

/// Cooperative cancellation for a result wait.
///
/// Cancelling abandons the local wait only; the backend task keeps running
/// unless [`TaskHandle::cancel`] is also called.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    /// Create an untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger the token, waking every waiter.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether the token has been triggered.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once the token is triggered.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Handle to one submitted task.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    client_token: Option<String>,
    poll: PollConfig,
    services: TaskServices,
    fallback_location: Option<OutputLocation>,
    metadata: Option<TaskMetadata>,
    result: Option<Arc<StructuredResult>>,
}

impl TaskHandle {
    /// Attach to an existing task.
    pub fn new(id: impl Into<TaskId>, services: TaskServices, poll: PollConfig) -> Self {
        Self {
            id: id.into(),
            client_token: None,
            poll,
            services,
            fallback_location: None,
            metadata: None,
            result: None,
        }
    }

    /// Attach to an existing task using client-wide defaults.
    pub fn from_config(
        id: impl Into<TaskId>,
        services: TaskServices,
        config: &ClientConfig,
    ) -> Self {
        let mut handle = Self::new(id, services, config.poll);
        handle.fallback_location = config.task_location(handle.id.as_str());
        handle
    }

    /// Output location to use when the status service does not report one.
    pub fn with_fallback_location(mut self, location: OutputLocation) -> Self {
        self.fallback_location = Some(location);
        self
    }

    /// Task identifier.
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    /// Idempotency key used at submission, if this handle submitted the task.
    pub fn client_token(&self) -> Option<&str> {
        self.client_token.as_deref()
    }

    /// Polling configuration.
    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    /// Last metadata snapshot, without a network call.
    pub fn cached_metadata(&self) -> Option<&TaskMetadata> {
        self.metadata.as_ref()
    }

    /// Cached result, without a network call.
    pub fn cached_result(&self) -> Option<&Arc<StructuredResult>> {
        self.result.as_ref()
    }

    /// Task metadata, from the cache or the status service.
    #[instrument(skip(self), fields(task_id = %self.id))]
    pub async fn metadata(&mut self, mode: CacheMode) -> TaskResult<TaskMetadata> {
        if let (CacheMode::Cached, Some(cached)) = (mode, &self.metadata) {
            return Ok(cached.clone());
        }
        let fresh = self.services.tasks.get_metadata(&self.id).await?;
        self.record(fresh.clone());
        Ok(self.metadata.clone().unwrap_or(fresh))
    }

    /// Current status, from the cache or the status service.
    pub async fn refresh_status(&mut self, mode: CacheMode) -> TaskResult<TaskStatus> {
        Ok(self.metadata(mode).await?.status)
    }

    /// Ask the backend to cancel the task.
    ///
    /// Returns once the request is accepted; the cached status is left
    /// alone until the next fresh refresh observes the change.
    #[instrument(skip(self), fields(task_id = %self.id))]
    pub async fn cancel(&self) -> TaskResult<()> {
        let status = self.services.tasks.cancel(&self.id).await?;
        tracing::info!(task_id = %self.id, %status, "cancellation requested");
        Ok(())
    }

    /// Wait for the task and return its structured result.
    ///
    /// Returns `Ok(None)` if the task failed, was cancelled, or did not
    /// finish within the poll timeout.
    pub async fn fetch_result(&mut self) -> TaskResult<Option<Arc<StructuredResult>>> {
        self.fetch_result_with_cancel(&CancelToken::new()).await
    }

    /// Like [`fetch_result`](Self::fetch_result), abandoning the wait when
    /// `token` is triggered.
    #[instrument(skip_all, fields(task_id = %self.id))]
    pub async fn fetch_result_with_cancel(
        &mut self,
        token: &CancelToken,
    ) -> TaskResult<Option<Arc<StructuredResult>>> {
        if let Some(result) = &self.result {
            return Ok(Some(Arc::clone(result)));
        }
        match self.metadata.as_ref().map(|m| m.status) {
            Some(status) if status.is_unsuccessful() => return Ok(None),
            Some(TaskStatus::Completed) => return self.download().await.map(Some),
            _ => {}
        }

        let deadline = Instant::now() + self.poll.timeout;
        loop {
            if token.is_cancelled() {
                tracing::debug!(task_id = %self.id, "result wait cancelled");
                return Ok(None);
            }

            let status = self.refresh_status(CacheMode::Fresh).await?;
            tracing::debug!(task_id = %self.id, %status, "polled task status");
            match status {
                TaskStatus::Completed => return self.download().await.map(Some),
                s if s.is_unsuccessful() => return Ok(None),
                _ => {}
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::info!(
                    task_id = %self.id,
                    timeout_secs = self.poll.timeout.as_secs_f64(),
                    "timed out waiting for task"
                );
                return Ok(None);
            }
            let nap = self.poll.interval.min(deadline - now);
            tokio::select! {
                () = tokio::time::sleep(nap) => {}
                () = token.cancelled() => {
                    tracing::debug!(task_id = %self.id, "result wait cancelled");
                    return Ok(None);
                }
            }
        }
    }

    /// Store a fresh snapshot unless a terminal one is already recorded.
    fn record(&mut self, fresh: TaskMetadata) {
        if fresh.status.is_unsuccessful() {
            tracing::warn!(
                task_id = %self.id,
                status = %fresh.status,
                reason = fresh.failure_reason.as_deref().unwrap_or("none reported"),
                "task ended without a result"
            );
        }

        let previous = self.metadata.as_ref().map(|m| m.status);
        if let Some(cached) = previous.filter(|s| s.is_terminal()) {
            tracing::debug!(
                task_id = %self.id,
                %cached,
                reported = %fresh.status,
                "keeping recorded terminal state"
            );
            return;
        }

        if previous != Some(fresh.status) {
            emit(
                self.services.events.as_ref(),
                TaskEvent::StatusChanged {
                    task_id: self.id.clone(),
                    from: previous,
                    to: fresh.status,
                },
            );
        }
        self.metadata = Some(fresh);
    }

    /// Fetch, decode and format the result of a completed task.
    async fn download(&mut self) -> TaskResult<Arc<StructuredResult>> {
        let (location, duration) = match &self.metadata {
            Some(m) => (m.output_location.clone(), m.execution_duration_ms),
            None => (None, None),
        };
        let location = location
            .or_else(|| self.fallback_location.clone())
            .ok_or_else(|| {
                TaskError::Configuration(format!("no output location known for task {}", self.id))
            })?;

        let blob = self.services.store.fetch_blob(&location).await?;
        let payload = self.services.decoder.decode(&blob)?;
        let mut result = format_result(payload)?;

        let metadata = result.metadata_mut();
        if metadata.execution_duration_ms.is_none() {
            metadata.execution_duration_ms = duration;
        }
        let duration = metadata.execution_duration_ms;
        if duration.is_none() {
            tracing::warn!(task_id = %self.id, "completed task reported no execution duration");
        }

        let result = Arc::new(result);
        self.result = Some(Arc::clone(&result));
        emit(
            self.services.events.as_ref(),
            TaskEvent::Completed {
                task_id: self.id.clone(),
                execution_duration_ms: duration,
            },
        );
        Ok(result)
    }
}

/// Build an envelope for `request`, submit it, and return a handle.
pub async fn submit_task(
    services: &TaskServices,
    context: &SubmissionContext,
    request: &TaskRequest,
    limits: &ShotLimits,
    poll: PollConfig,
) -> TaskResult<TaskHandle> {
    let envelope = build_envelope(request, limits)?;

    let id = {
        let _slot = context.acquire();
        services.tasks.submit(&envelope, context).await?
    };
    tracing::info!(
        task_id = %id,
        device = %envelope.device_arn,
        shots = envelope.shots,
        "task submitted"
    );
    emit(
        services.events.as_ref(),
        TaskEvent::Submitted {
            task_id: id.clone(),
            device_arn: envelope.device_arn.clone(),
            shots: envelope.shots,
        },
    );

    let fallback = OutputLocation::new(
        envelope.output_s3_bucket,
        format!("{}/{id}", envelope.output_s3_key_prefix.trim_end_matches('/')),
    );
    let mut handle = TaskHandle::new(id, services.clone(), poll).with_fallback_location(fallback);
    handle.client_token = Some(envelope.client_token);
    Ok(handle)
}
