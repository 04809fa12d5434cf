//! Raw result payloads as decoded from the result blob.
//!
//! These mirror what a device writes, before any client-side analysis.
//! Optional fields stay optional here; the formatter decides which
//! combinations are acceptable.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::program::TaskSpec;
use crate::result::{ProblemType, ResultMetadata};
use crate::result_type::ReportedResultType;

/// Raw gate-model result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateModelRaw {
    /// Task metadata.
    pub metadata: ResultMetadata,
    /// Per-shot outcomes.
    #[serde(default)]
    pub measurements: Option<Vec<Vec<u8>>>,
    /// Per-bitstring probabilities.
    #[serde(default)]
    pub measurement_probabilities: Option<FxHashMap<String, f64>>,
    /// Logical qubit of each outcome column.
    #[serde(default)]
    pub measured_qubits: Option<Vec<usize>>,
    /// Result types echoed by the device, with or without values.
    #[serde(default)]
    pub result_types: Option<Vec<ReportedResultType>>,
    /// The submitted program, echoed back.
    #[serde(default)]
    pub action: Option<TaskSpec>,
}

/// Raw annealing result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnealingRaw {
    /// Task metadata.
    pub metadata: ResultMetadata,
    /// Problem formulation.
    pub problem_type: ProblemType,
    /// Distinct variable assignments.
    pub solutions: Vec<Vec<i32>>,
    /// Objective value of each solution.
    pub values: Vec<f64>,
    /// Read count of each solution; absent means one read each.
    #[serde(default)]
    pub solution_counts: Option<Vec<u64>>,
    /// Number of variables, if reported.
    #[serde(default)]
    pub variable_count: Option<usize>,
}

/// Raw photonic result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotonicRaw {
    /// Task metadata.
    pub metadata: ResultMetadata,
    /// Measurement tensor indexed `[shot][measurement][mode]`.
    pub measurements: Vec<Vec<Vec<i64>>>,
}

/// One raw analog-Hamiltonian shot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalogShotRaw {
    /// Device status code, e.g. `"Success"` or `"Partial Success"`.
    pub shot_status: String,
    /// Site occupation before the sequence.
    #[serde(default)]
    pub pre_sequence: Option<Vec<u8>>,
    /// Site occupation after the sequence.
    #[serde(default)]
    pub post_sequence: Option<Vec<u8>>,
}

/// Raw analog-Hamiltonian result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalogHamiltonianRaw {
    /// Task metadata.
    pub metadata: ResultMetadata,
    /// Shots in acquisition order.
    pub measurements: Vec<AnalogShotRaw>,
}

/// Decoded result blob, one variant per device paradigm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "paradigm", rename_all = "snake_case")]
pub enum RawResultPayload {
    /// Gate-model result.
    GateModel(GateModelRaw),
    /// Annealing result.
    Annealing(AnnealingRaw),
    /// Photonic result.
    Photonic(PhotonicRaw),
    /// Analog-Hamiltonian result.
    AnalogHamiltonian(AnalogHamiltonianRaw),
}

impl RawResultPayload {
    /// Task metadata carried by the payload.
    pub fn metadata(&self) -> &ResultMetadata {
        match self {
            Self::GateModel(raw) => &raw.metadata,
            Self::Annealing(raw) => &raw.metadata,
            Self::Photonic(raw) => &raw.metadata,
            Self::AnalogHamiltonian(raw) => &raw.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_model_payload_deserialize() {
        let json = r#"{
            "paradigm": "gate_model",
            "metadata": {"task_id": "t-1", "shots": 4},
            "measurements": [[0, 0], [1, 1], [0, 0], [1, 1]],
            "measuredQubits": [0, 1]
        }"#;
        let payload: RawResultPayload = serde_json::from_str(json).unwrap();
        let RawResultPayload::GateModel(raw) = payload else {
            panic!("expected gate-model payload");
        };
        assert_eq!(raw.metadata.task_id, "t-1");
        assert_eq!(raw.measurements.unwrap().len(), 4);
        assert!(raw.measurement_probabilities.is_none());
        assert!(raw.action.is_none());
    }

    #[test]
    fn test_annealing_payload_deserialize() {
        let json = r#"{
            "paradigm": "annealing",
            "metadata": {"task_id": "t-2", "shots": 10},
            "problemType": "ISING",
            "solutions": [[1, -1], [1, 1]],
            "values": [-1.0, 2.0]
        }"#;
        let payload: RawResultPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.metadata().shots, 10);
        let RawResultPayload::Annealing(raw) = payload else {
            panic!("expected annealing payload");
        };
        assert_eq!(raw.problem_type, ProblemType::Ising);
        assert!(raw.solution_counts.is_none());
    }

    #[test]
    fn test_analog_payload_keeps_null_sequences() {
        let json = r#"{
            "paradigm": "analog_hamiltonian",
            "metadata": {"task_id": "t-3", "shots": 1},
            "measurements": [{"shotStatus": "Failure", "preSequence": null, "postSequence": null}]
        }"#;
        let payload: RawResultPayload = serde_json::from_str(json).unwrap();
        let RawResultPayload::AnalogHamiltonian(raw) = payload else {
            panic!("expected analog-Hamiltonian payload");
        };
        assert!(raw.measurements[0].pre_sequence.is_none());
    }
}
