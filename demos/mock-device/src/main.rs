//! Minimal in-memory device driving a task through its lifecycle.
//!
//! The device answers `QUEUED`, `RUNNING`, then `COMPLETED`, and serves a
//! Bell-state result blob. Run with `RUST_LOG=quantum_task=debug` to see
//! the polling loop.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use quantum_task::device::IONQ_ARIA;
use quantum_task::observable::Observable;
use quantum_task::program::GateModelProgram;
use quantum_task::{
    ClientConfig, OutputLocation, ResultStore, ResultTypeRequest, ShotLimits, SubmissionContext,
    SubmissionEnvelope, TaskError, TaskId, TaskMetadata, TaskRequest, TaskResult, TaskService,
    TaskServices, TaskSpec, TaskStatus, submit_task,
};
use tracing_subscriber::EnvFilter;

const SCRIPT: [TaskStatus; 3] = [TaskStatus::Queued, TaskStatus::Running, TaskStatus::Completed];

/// In-memory mock device.
struct MockDevice {
    polls: Mutex<HashMap<String, usize>>,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    next_id: AtomicU64,
}

impl MockDevice {
    fn new() -> Self {
        Self {
            polls: Mutex::new(HashMap::new()),
            blobs: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl TaskService for MockDevice {
    async fn submit(
        &self,
        envelope: &SubmissionEnvelope,
        _context: &SubmissionContext,
    ) -> TaskResult<TaskId> {
        let id = format!("mock-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let shots = envelope.shots;

        // Half |00>, half |11>.
        let rows: Vec<[u8; 2]> = (0..shots)
            .map(|i| if i % 2 == 0 { [0, 0] } else { [1, 1] })
            .collect();
        let blob = serde_json::json!({
            "paradigm": "gate_model",
            "metadata": {"task_id": id, "device_arn": envelope.device_arn, "shots": shots},
            "measurements": rows,
            "measuredQubits": [0, 1],
        });

        let location = OutputLocation::new(
            envelope.output_s3_bucket.clone(),
            format!("{}/{id}", envelope.output_s3_key_prefix),
        );
        self.blobs
            .lock()
            .map_err(|e| TaskError::Backend(e.to_string()))?
            .insert(location.results_key(), serde_json::to_vec(&blob)?);
        self.polls
            .lock()
            .map_err(|e| TaskError::Backend(e.to_string()))?
            .insert(id.clone(), 0);

        Ok(TaskId::new(id))
    }

    async fn get_metadata(&self, task_id: &TaskId) -> TaskResult<TaskMetadata> {
        let mut polls = self
            .polls
            .lock()
            .map_err(|e| TaskError::Backend(e.to_string()))?;
        let count = polls
            .get_mut(task_id.as_str())
            .ok_or_else(|| TaskError::TaskNotFound(task_id.to_string()))?;
        let status = SCRIPT[(*count).min(SCRIPT.len() - 1)];
        *count += 1;

        let metadata = TaskMetadata::new(task_id.clone(), status);
        Ok(if status == TaskStatus::Completed {
            metadata.with_execution_duration_ms(42)
        } else {
            metadata
        })
    }

    async fn cancel(&self, task_id: &TaskId) -> TaskResult<TaskStatus> {
        let polls = self
            .polls
            .lock()
            .map_err(|e| TaskError::Backend(e.to_string()))?;
        if polls.contains_key(task_id.as_str()) {
            Ok(TaskStatus::Cancelling)
        } else {
            Err(TaskError::TaskNotFound(task_id.to_string()))
        }
    }
}

#[async_trait]
impl ResultStore for MockDevice {
    async fn fetch_blob(&self, location: &OutputLocation) -> TaskResult<Vec<u8>> {
        let key = location.results_key();
        self.blobs
            .lock()
            .map_err(|e| TaskError::Storage(e.to_string()))?
            .get(&key)
            .cloned()
            .ok_or_else(|| {
                TaskError::Storage(format!("no object at s3://{}/{key}", location.bucket))
            })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let device = std::sync::Arc::new(MockDevice::new());
    let services = TaskServices::new(device.clone(), device);

    let mut config = ClientConfig::from_env()?;
    config.poll = config.poll.with_interval(Duration::from_millis(100));
    let destination = config
        .destination
        .clone()
        .unwrap_or_else(|| OutputLocation::new("demo-bucket", "tasks"));

    // Bell pair with a ZZ expectation
    let program = GateModelProgram::new(
        "OPENQASM 3.0; qubit[2] q; bit[2] c; h q[0]; cnot q[0], q[1]; c = measure q;",
        2,
    )
    .with_result_type(ResultTypeRequest::expectation(
        Observable::tensor([Observable::z(), Observable::z()]),
        [0, 1],
    ))
    .with_result_type(ResultTypeRequest::probability(vec![0, 1]));
    let spec = TaskSpec::GateModelCircuit(program);
    let request =
        TaskRequest::new(spec, IONQ_ARIA, destination, 1000).with_tag("demo", "mock-device");

    let context = SubmissionContext::new().with_header("user-agent", "quantum-task-demo");
    let mut handle = submit_task(
        &services,
        &context,
        &request,
        &ShotLimits::new(1, 10_000),
        config.poll,
    )
    .await?;
    println!("Task ID: {}", handle.id());

    let Some(result) = handle.fetch_result().await? else {
        println!("Task did not complete");
        return Ok(());
    };
    let Some(gate) = result.as_gate_model() else {
        return Err("expected a gate-model result".into());
    };

    println!("Shots:  {}", gate.metadata.shots);
    println!("Time:   {}ms", gate.metadata.execution_duration_ms.unwrap_or(0));
    println!();

    println!("Results:");
    if let Some(counts) = &gate.measurement_counts {
        for (bitstring, count) in counts.sorted() {
            println!("  {bitstring}: {count}");
        }
    }
    if let Some((bitstring, prob)) = gate.most_frequent() {
        println!("\nMost frequent: {bitstring} ({:.1}%)", prob * 100.0);
    }

    println!();
    for value in &gate.result_types {
        println!("{} = {:?}", value.request, value.value);
    }

    Ok(())
}
