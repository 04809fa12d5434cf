//! Provider-specific device parameters.
//!
//! The provider is picked from the device ARN by substring match against an
//! ordered table, first match wins:
//!
//! | Spec kind | Marker | Parameters |
//! |-----------|--------|------------|
//! | annealing | `Advantage` | [`DeviceParameters::DwaveAdvantage`] |
//! | annealing | `2000Q` | [`DeviceParameters::Dwave2000Q`] |
//! | gate model | `ionq` | [`DeviceParameters::IonQ`] |
//! | gate model | `rigetti` | [`DeviceParameters::Rigetti`] |
//! | gate model | `oqc` | [`DeviceParameters::Oqc`] |
//! | gate model | *(none)* | [`DeviceParameters::GateModelSimulator`] |
//!
//! An annealing spec with no matching marker is an [`TaskError::UnknownDevice`].

use serde::{Deserialize, Serialize};

use crate::error::{TaskError, TaskResult};

/// SV1 state vector simulator.
pub const SV1: &str = "arn:aws:braket:::device/quantum-simulator/amazon/sv1";

/// IonQ Aria.
pub const IONQ_ARIA: &str = "arn:aws:braket:us-east-1::device/qpu/ionq/Aria-1";

/// Rigetti Ankaa-3.
pub const RIGETTI_ANKAA_3: &str = "arn:aws:braket:us-west-1::device/qpu/rigetti/Ankaa-3";

/// OQC Lucy.
pub const OQC_LUCY: &str = "arn:aws:braket:eu-west-2::device/qpu/oqc/Lucy";

/// D-Wave Advantage 6.1.
pub const DWAVE_ADVANTAGE: &str = "arn:aws:braket:::device/qpu/d-wave/Advantage_system6";

/// D-Wave 2000Q 6.
pub const DWAVE_2000Q: &str = "arn:aws:braket:::device/qpu/d-wave/DW_2000Q_6";

/// Device provider, as resolved from the ARN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// Managed gate-model simulator (fallback).
    GateModelSimulator,
    /// IonQ trapped-ion QPU.
    IonQ,
    /// Rigetti superconducting QPU.
    Rigetti,
    /// OQC superconducting QPU.
    Oqc,
    /// D-Wave Advantage annealer.
    DwaveAdvantage,
    /// D-Wave 2000Q annealer.
    Dwave2000Q,
}

/// Markers for annealing devices.
pub const ANNEALING_PROVIDERS: &[(&str, Provider)] = &[
    ("Advantage", Provider::DwaveAdvantage),
    ("2000Q", Provider::Dwave2000Q),
];

/// Markers for gate-model devices.
pub const GATE_MODEL_PROVIDERS: &[(&str, Provider)] = &[
    ("ionq", Provider::IonQ),
    ("rigetti", Provider::Rigetti),
    ("oqc", Provider::Oqc),
];

/// First provider in `table` whose marker occurs in `device_arn`.
pub fn match_provider(table: &[(&str, Provider)], device_arn: &str) -> Option<Provider> {
    table
        .iter()
        .find(|(marker, _)| device_arn.contains(marker))
        .map(|&(_, provider)| provider)
}

/// Provider of an annealing device.
pub fn annealing_provider(device_arn: &str) -> TaskResult<Provider> {
    match_provider(ANNEALING_PROVIDERS, device_arn)
        .ok_or_else(|| TaskError::UnknownDevice(device_arn.to_string()))
}

/// Provider of a gate-model device, defaulting to the simulator.
pub fn gate_model_provider(device_arn: &str) -> Provider {
    match_provider(GATE_MODEL_PROVIDERS, device_arn).unwrap_or(Provider::GateModelSimulator)
}

/// Paradigm parameters shared by every gate-model provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateModelParameters {
    /// Qubits used by the program.
    pub qubit_count: usize,
    /// Run on the requested physical qubits without remapping.
    pub disable_qubit_rewiring: bool,
}

/// Provider-level options accepted by D-Wave annealers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DwaveOptions {
    /// Per-qubit annealing offsets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annealing_offsets: Option<Vec<f64>>,
    /// Annealing schedule as `(time, fraction)` points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annealing_schedule: Option<Vec<(f64, f64)>>,
    /// Annealing duration in microseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annealing_duration: Option<f64>,
    /// Rescale coefficients to the device range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scale: Option<bool>,
    /// Compensate for flux drift.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensate_flux_drift: Option<bool>,
    /// Initial state for reverse annealing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<Vec<i32>>,
    /// Maximum number of distinct solutions to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u64>,
    /// Microseconds to wait after programming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programming_thermalization: Option<u64>,
    /// Microseconds to wait after each readout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readout_thermalization: Option<u64>,
    /// Add delay between reads to reduce correlation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce_intersample_correlation: Option<bool>,
    /// Spin-reversal transforms to apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin_reversal_transform_count: Option<u64>,
    /// Postprocessing mode (2000Q only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postprocessing_type: Option<String>,
}

/// Provider-specific execution configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum DeviceParameters {
    /// Managed simulator.
    GateModelSimulator(GateModelParameters),
    /// IonQ.
    #[serde(rename = "ionq")]
    IonQ(GateModelParameters),
    /// Rigetti.
    Rigetti(GateModelParameters),
    /// OQC.
    Oqc(GateModelParameters),
    /// D-Wave Advantage.
    DwaveAdvantage(DwaveOptions),
    /// D-Wave 2000Q.
    #[serde(rename = "dwave_2000q")]
    Dwave2000Q(DwaveOptions),
}

impl DeviceParameters {
    /// Build gate-model parameters for `provider`.
    pub fn gate_model(provider: Provider, params: GateModelParameters) -> TaskResult<Self> {
        match provider {
            Provider::GateModelSimulator => Ok(Self::GateModelSimulator(params)),
            Provider::IonQ => Ok(Self::IonQ(params)),
            Provider::Rigetti => Ok(Self::Rigetti(params)),
            Provider::Oqc => Ok(Self::Oqc(params)),
            Provider::DwaveAdvantage | Provider::Dwave2000Q => {
                Err(TaskError::InvalidDeviceParameters(format!(
                    "{provider:?} does not run gate-model programs"
                )))
            }
        }
    }

    /// Build annealing parameters for `provider`.
    pub fn annealing(provider: Provider, options: DwaveOptions) -> TaskResult<Self> {
        match provider {
            Provider::DwaveAdvantage => {
                if options.postprocessing_type.is_some() {
                    return Err(TaskError::InvalidDeviceParameters(
                        "postprocessingType is not supported on Advantage".into(),
                    ));
                }
                Ok(Self::DwaveAdvantage(options))
            }
            Provider::Dwave2000Q => Ok(Self::Dwave2000Q(options)),
            other => Err(TaskError::InvalidDeviceParameters(format!(
                "{other:?} does not run annealing problems"
            ))),
        }
    }

    /// Provider these parameters are for.
    pub fn provider(&self) -> Provider {
        match self {
            Self::GateModelSimulator(_) => Provider::GateModelSimulator,
            Self::IonQ(_) => Provider::IonQ,
            Self::Rigetti(_) => Provider::Rigetti,
            Self::Oqc(_) => Provider::Oqc,
            Self::DwaveAdvantage(_) => Provider::DwaveAdvantage,
            Self::Dwave2000Q(_) => Provider::Dwave2000Q,
        }
    }
}

/// Shot range a device accepts, as reported by device metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotLimits {
    /// Smallest accepted shot count.
    pub min: u64,
    /// Largest accepted shot count.
    pub max: u64,
}

impl ShotLimits {
    /// Create a shot range.
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Check if `shots` is inside the range.
    pub fn contains(&self, shots: u64) -> bool {
        (self.min..=self.max).contains(&shots)
    }
}
