//! Task input construction.
//!
//! [`build_envelope`] is a pure transform from a [`TaskRequest`] to the
//! [`SubmissionEnvelope`] handed to the submission service. Device
//! parameters are resolved by task kind first, then by ARN marker (see
//! [`crate::device`]). Every call mints a fresh client token.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::device::{
    DeviceParameters, DwaveOptions, GateModelParameters, ShotLimits, annealing_provider,
    gate_model_provider,
};
use crate::error::{TaskError, TaskResult};
use crate::program::TaskSpec;
use crate::result_type::ResultTypeKind;

/// Object-storage location of task output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputLocation {
    /// Bucket name.
    pub bucket: String,
    /// Key prefix (directory) inside the bucket.
    pub key_prefix: String,
}

impl OutputLocation {
    /// Create a location.
    pub fn new(bucket: impl Into<String>, key_prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key_prefix: key_prefix.into(),
        }
    }

    /// Key of the result blob inside this directory.
    pub fn results_key(&self) -> String {
        format!("{}/results.json", self.key_prefix.trim_end_matches('/'))
    }
}

/// Everything the caller provides for one submission.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    /// Job definition.
    pub spec: TaskSpec,
    /// Target device.
    pub device_arn: String,
    /// Where the device writes results.
    pub destination: OutputLocation,
    /// Number of shots; zero requests an analytic result.
    pub shots: u64,
    /// Provider-level parameters (D-Wave options for annealing problems).
    pub device_parameters: Option<serde_json::Value>,
    /// Run on the requested physical qubits without remapping.
    pub disable_qubit_rewiring: bool,
    /// Tags attached to the task.
    pub tags: BTreeMap<String, String>,
    /// Extra options passed to the provider verbatim.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TaskRequest {
    /// Create a request with no tags or provider options.
    pub fn new(
        spec: TaskSpec,
        device_arn: impl Into<String>,
        destination: OutputLocation,
        shots: u64,
    ) -> Self {
        Self {
            spec,
            device_arn: device_arn.into(),
            destination,
            shots,
            device_parameters: None,
            disable_qubit_rewiring: false,
            tags: BTreeMap::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Set provider-level device parameters.
    pub fn with_device_parameters(mut self, params: serde_json::Value) -> Self {
        self.device_parameters = Some(params);
        self
    }

    /// Disable qubit rewiring.
    pub fn with_qubit_rewiring_disabled(mut self) -> Self {
        self.disable_qubit_rewiring = true;
        self
    }

    /// Attach a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Attach an extra provider option.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Backend-agnostic submission payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionEnvelope {
    /// Serialized job definition.
    pub action: String,
    /// Idempotency key.
    pub client_token: String,
    /// Target device.
    pub device_arn: String,
    /// Output bucket.
    pub output_s3_bucket: String,
    /// Output key prefix.
    pub output_s3_key_prefix: String,
    /// Number of shots.
    pub shots: u64,
    /// Serialized device parameters; `None` when the paradigm has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_parameters: Option<String>,
    /// Task tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Extra provider options.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Resolve the provider device parameters for `request`.
pub fn resolve_device_parameters(request: &TaskRequest) -> TaskResult<Option<DeviceParameters>> {
    match &request.spec {
        TaskSpec::AnnealingProblem(_) => {
            let provider = annealing_provider(&request.device_arn)?;
            let options = match &request.device_parameters {
                Some(value) => serde_json::from_value::<DwaveOptions>(value.clone())
                    .map_err(|e| TaskError::InvalidDeviceParameters(e.to_string()))?,
                None => DwaveOptions::default(),
            };
            DeviceParameters::annealing(provider, options).map(Some)
        }
        TaskSpec::GateModelCircuit(_) | TaskSpec::GenericIrProgram(_) => {
            reject_provider_parameters(request)?;
            let params = GateModelParameters {
                qubit_count: request.spec.width(),
                disable_qubit_rewiring: request.disable_qubit_rewiring,
            };
            DeviceParameters::gate_model(gate_model_provider(&request.device_arn), params).map(Some)
        }
        TaskSpec::PhotonicProgram(_) | TaskSpec::AnalogHamiltonianProgram(_) => {
            reject_provider_parameters(request)?;
            Ok(None)
        }
    }
}

fn reject_provider_parameters(request: &TaskRequest) -> TaskResult<()> {
    match &request.device_parameters {
        Some(_) => Err(TaskError::InvalidDeviceParameters(format!(
            "{} specs take no provider-level parameters",
            request.spec.kind()
        ))),
        None => Ok(()),
    }
}

/// Check the shot count against the task kind and the device's range.
pub fn validate_shots(spec: &TaskSpec, shots: u64, limits: &ShotLimits) -> TaskResult<()> {
    let invalid = |reason: String| Err(TaskError::InvalidShotCount { shots, reason });

    if shots == 0 {
        if !spec.is_gate_model() {
            return invalid(format!("{} tasks need at least one shot", spec.kind()));
        }
        if let Some(r) = spec
            .declared_result_types()
            .iter()
            .find(|r| r.kind == ResultTypeKind::Sample)
        {
            return invalid(format!("{r} needs shots"));
        }
    } else if let Some(r) = spec.declared_result_types().iter().find(|r| {
        matches!(
            r.kind,
            ResultTypeKind::StateVector | ResultTypeKind::DensityMatrix | ResultTypeKind::Amplitude
        )
    }) {
        return invalid(format!("{r} is only available with zero shots"));
    }

    if !limits.contains(shots) {
        return invalid(format!("device accepts {}..={} shots", limits.min, limits.max));
    }
    Ok(())
}

/// Build the submission envelope for `request`.
pub fn build_envelope(
    request: &TaskRequest,
    limits: &ShotLimits,
) -> TaskResult<SubmissionEnvelope> {
    validate_shots(&request.spec, request.shots, limits)?;

    let device_parameters = resolve_device_parameters(request)?
        .map(|params| serde_json::to_string(&params))
        .transpose()?;

    Ok(SubmissionEnvelope {
        action: request.spec.to_action()?,
        client_token: Uuid::new_v4().to_string(),
        device_arn: request.device_arn.clone(),
        output_s3_bucket: request.destination.bucket.clone(),
        output_s3_key_prefix: request.destination.key_prefix.clone(),
        shots: request.shots,
        device_parameters,
        tags: request.tags.clone(),
        extra: request.extra.clone(),
    })
}

/// Per-client state scoped around submission calls.
///
/// Carries request headers for the submission service and counts
/// submissions currently in flight. The count is only held for the
/// duration of a [`SubmissionGuard`].
#[derive(Debug, Clone, Default)]
pub struct SubmissionContext {
    headers: BTreeMap<String, String>,
    in_flight: Arc<AtomicUsize>,
}

impl SubmissionContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header sent with every submission.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Headers to send with a submission.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Submissions currently holding a guard.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Mark a submission as in flight until the guard is dropped.
    pub fn acquire(&self) -> SubmissionGuard {
        let active = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(active, "submission slot acquired");
        SubmissionGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

/// Releases a submission slot on drop.
#[derive(Debug)]
pub struct SubmissionGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for SubmissionGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
