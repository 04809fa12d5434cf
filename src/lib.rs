//! Quantum Task: client-side runtime for quantum tasks
//!
//! This crate turns a job specification into a submission payload, tracks
//! the submitted task until it reaches a terminal state, and converts the
//! raw measurement data the device returns into structured statistical
//! results.
//!
//! # Overview
//!
//! The runtime provides:
//! - [`build_envelope`] to build a [`SubmissionEnvelope`] from a [`TaskRequest`]
//! - [`TaskHandle`] to poll a task, cancel it and fetch its result
//! - [`format_result`] to turn a [`RawResultPayload`] into a [`StructuredResult`]
//! - [`calculate_result_types`] for probabilities, samples, expectations
//!   and variances over arbitrary observables and qubit subsets
//! - [`stats`] with the underlying counting and eigenvalue arithmetic
//! - [`TaskError`] with categorized error variants
//!
//! # Collaborators
//!
//! Transport and storage are supplied by the caller through
//! [`TaskService`], [`ResultStore`], [`ResultDecoder`] and [`EventSink`]:
//!
//! ```ignore
//! use quantum_task::{SubmissionContext, SubmissionEnvelope, TaskId, TaskMetadata, TaskResult, TaskService, TaskStatus};
//! use async_trait::async_trait;
//!
//! struct MyService { /* ... */ }
//!
//! #[async_trait]
//! impl TaskService for MyService {
//!     async fn submit(&self, envelope: &SubmissionEnvelope, ctx: &SubmissionContext) -> TaskResult<TaskId> { /* ... */ }
//!     async fn get_metadata(&self, id: &TaskId) -> TaskResult<TaskMetadata> { /* ... */ }
//!     async fn cancel(&self, id: &TaskId) -> TaskResult<TaskStatus> { /* ... */ }
//! }
//! ```
//!
//! # Lifecycle
//!
//! ```text
//!   build_envelope() ──→ submit() ──→ refresh_status() ──→ fetch_result()
//!       (pure)           (async)          (async)             (async)
//!                                                               │
//!                          format_result() ←── fetch_blob() ←───┘
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod formatter;
pub mod input;
pub mod measurement;
pub mod observable;
pub mod payload;
pub mod program;
pub mod result;
pub mod result_type;
pub mod service;
pub mod stats;
pub mod status;
pub mod task;

pub use config::{ClientConfig, PollConfig};
pub use device::{DeviceParameters, DwaveOptions, GateModelParameters, Provider, ShotLimits};
pub use error::{ErrorCategory, TaskError, TaskResult};
pub use event::{EventSink, NoopEventSink, TaskEvent};
pub use formatter::format_result;
pub use input::{
    OutputLocation, SubmissionContext, SubmissionEnvelope, SubmissionGuard, TaskRequest,
    build_envelope,
};
pub use measurement::{MeasurementSet, Outcome};
pub use observable::{Observable, StandardObservable};
pub use payload::RawResultPayload;
pub use program::TaskSpec;
pub use result::{
    AnalogHamiltonianResult, AnnealingResult, Counts, DataSource, GateModelResult,
    MeasurementProvenance, PhotonicResult, ResultMetadata, StructuredResult,
};
pub use result_type::{
    ResultTypeKind, ResultTypeRequest, ResultTypeValue, ResultValue, calculate_result_type,
    calculate_result_types,
};
pub use service::{JsonResultDecoder, ResultDecoder, ResultStore, TaskService, TaskServices};
pub use status::{CacheMode, TaskId, TaskMetadata, TaskStatus};
pub use task::{CancelToken, TaskHandle, submit_task};
