//! Structured task results.
//!
//! Bitstring ordering: the leftmost character corresponds to the first
//! measured qubit. For example, with `measured_qubits = [0, 1]` the string
//! `"01"` means qubit 0 measured `0` and qubit 1 measured `1`.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::measurement::MeasurementSet;
use crate::result_type::ResultTypeValue;

/// Measurement counts from circuit execution.
///
/// Maps bitstrings to occurrence counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// Map from bitstring to count.
    counts: FxHashMap<String, u64>,
}

impl Counts {
    /// Create empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create counts from an iterator of (bitstring, count) pairs.
    /// Duplicate bitstrings are accumulated (summed), consistent with `insert()`.
    pub fn from_pairs(iter: impl IntoIterator<Item = (impl Into<String>, u64)>) -> Self {
        let mut counts = Self::new();
        for (k, v) in iter {
            counts.insert(k, v);
        }
        counts
    }

    /// Insert a count for a bitstring.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.counts.entry(bitstring.into()).or_default() += count;
    }

    /// Get the count for a bitstring.
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Iterate over (bitstring, count) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.counts.iter()
    }

    /// Get the total number of shots.
    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Get the most frequent bitstring.
    pub fn most_frequent(&self) -> Option<(&String, &u64)> {
        self.counts.iter().max_by_key(|&(_, count)| count)
    }

    /// Get probabilities for each bitstring.
    #[allow(clippy::cast_precision_loss)]
    pub fn probabilities(&self) -> FxHashMap<String, f64> {
        let total = self.total_shots() as f64;
        if total == 0.0 {
            return FxHashMap::default();
        }
        self.counts
            .iter()
            .map(|(k, &v)| (k.clone(), v as f64 / total))
            .collect()
    }

    /// Get sorted counts (by count descending, then bitstring).
    pub fn sorted(&self) -> Vec<(&String, &u64)> {
        let mut items: Vec<_> = self.counts.iter().collect();
        items.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        items
    }

    /// Get the number of unique bitstrings.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if counts are empty.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut counts = Self::new();
        for (key, value) in iter {
            counts.insert(key, value);
        }
        counts
    }
}

/// Where a piece of measurement data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    /// Copied verbatim from the device result.
    DeviceReported,
    /// Computed client-side from other fields.
    Derived,
}

/// Provenance of the measurement fields of a [`GateModelResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementProvenance {
    /// Source of the per-shot outcomes.
    pub measurements: DataSource,
    /// Source of the counts.
    pub counts: DataSource,
    /// Source of the probabilities.
    pub probabilities: DataSource,
}

/// Backend-reported facts about the task that produced a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// Task identifier.
    pub task_id: String,
    /// Device the task ran on.
    #[serde(default)]
    pub device_arn: String,
    /// Shots requested.
    pub shots: u64,
    /// Execution time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_duration_ms: Option<u64>,
    /// When the task was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the task finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl ResultMetadata {
    /// Create metadata for a task.
    pub fn new(task_id: impl Into<String>, shots: u64) -> Self {
        Self {
            task_id: task_id.into(),
            shots,
            ..Self::default()
        }
    }

    /// Set the device ARN.
    pub fn with_device(mut self, device_arn: impl Into<String>) -> Self {
        self.device_arn = device_arn.into();
        self
    }

    /// Set the execution time.
    pub fn with_execution_time(mut self, time_ms: u64) -> Self {
        self.execution_duration_ms = Some(time_ms);
        self
    }
}

/// Result of a gate-model task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateModelResult {
    /// Task metadata.
    pub metadata: ResultMetadata,
    /// Shot outcomes; `None` for analytic (zero-shot) results.
    pub measurements: Option<MeasurementSet>,
    /// Measured qubits, one per outcome column.
    pub measured_qubits: Vec<usize>,
    /// Counts per bitstring.
    pub measurement_counts: Option<Counts>,
    /// Probability per bitstring.
    pub measurement_probabilities: Option<FxHashMap<String, f64>>,
    /// Values of the requested result types, in request order.
    pub result_types: Vec<ResultTypeValue>,
    /// Where the measurement fields came from; `None` for analytic results.
    pub provenance: Option<MeasurementProvenance>,
}

impl GateModelResult {
    /// Get the most frequent bitstring and its probability.
    #[allow(clippy::cast_precision_loss)]
    pub fn most_frequent(&self) -> Option<(&String, f64)> {
        let counts = self.measurement_counts.as_ref()?;
        let total = counts.total_shots() as f64;
        if total == 0.0 {
            return None;
        }
        counts.most_frequent().map(|(s, &c)| (s, c as f64 / total))
    }
}

/// Formulation of an annealing problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProblemType {
    /// Quadratic unconstrained binary optimization, variables in `{0, 1}`.
    Qubo,
    /// Ising model, spins in `{-1, +1}`.
    Ising,
}

/// One distinct solution returned by an annealer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionRecord {
    /// Position of the solution in the device response.
    pub ordinal: usize,
    /// Variable assignment.
    pub solution: Vec<i32>,
    /// Objective value.
    pub value: f64,
    /// Number of times the solution was read.
    pub count: u64,
}

/// Result of an annealing task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnealingResult {
    /// Task metadata.
    pub metadata: ResultMetadata,
    /// Problem formulation.
    pub problem_type: ProblemType,
    /// Number of variables in every solution.
    pub variable_count: usize,
    /// Record table, one row per solution ordinal.
    pub records: Vec<SolutionRecord>,
}

impl AnnealingResult {
    /// Record with the lowest objective value.
    pub fn lowest_energy(&self) -> Option<&SolutionRecord> {
        self.records.iter().min_by(|a, b| a.value.total_cmp(&b.value))
    }

    /// Total number of reads across all records.
    pub fn total_occurrences(&self) -> u64 {
        self.records.iter().map(|r| r.count).sum()
    }
}

/// Result of a photonic task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotonicResult {
    /// Task metadata.
    pub metadata: ResultMetadata,
    /// Measurement tensor indexed `[shot][measurement][mode]`.
    pub measurements: Vec<Vec<Vec<i64>>>,
    /// Tensor shape `[shots, measurements per shot, modes]`.
    pub shape: [usize; 3],
}

/// Classification of an analog-Hamiltonian shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotStatus {
    /// All sites were read.
    Success,
    /// Some sites could not be read.
    PartialSuccess,
    /// The shot failed.
    Failure,
}

impl ShotStatus {
    /// Parse the device's status code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().replace(['_', ' '], "").as_str() {
            "success" => Some(Self::Success),
            "partialsuccess" => Some(Self::PartialSuccess),
            "failure" | "fail" => Some(Self::Failure),
            _ => None,
        }
    }
}

/// One analog-Hamiltonian shot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotMeasurement {
    /// Shot classification.
    pub status: ShotStatus,
    /// Site occupation before the sequence; `None` if the device sent null.
    pub pre_sequence: Option<Vec<u8>>,
    /// Site occupation after the sequence; `None` if the device sent null.
    pub post_sequence: Option<Vec<u8>>,
}

/// Result of an analog-Hamiltonian task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalogHamiltonianResult {
    /// Task metadata.
    pub metadata: ResultMetadata,
    /// Shots in acquisition order.
    pub measurements: Vec<ShotMeasurement>,
}

impl AnalogHamiltonianResult {
    /// Tally successful shots into per-site state strings.
    ///
    /// Each site reads `e` (empty before the sequence), `r` (filled, then
    /// empty: Rydberg) or `g` (filled before and after: ground). Shots that
    /// are not successful or have a null sequence are skipped.
    pub fn counts(&self) -> Counts {
        let mut counts = Counts::new();
        for shot in &self.measurements {
            if shot.status != ShotStatus::Success {
                continue;
            }
            let (Some(pre), Some(post)) = (&shot.pre_sequence, &shot.post_sequence) else {
                continue;
            };
            let state: String = pre
                .iter()
                .zip(post)
                .map(|(&p, &q)| match (p, q) {
                    (0, _) => 'e',
                    (_, 0) => 'r',
                    _ => 'g',
                })
                .collect();
            counts.insert(state, 1);
        }
        counts
    }
}

/// Final result of a task, one variant per payload kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuredResult {
    /// Gate-model circuit result.
    GateModel(GateModelResult),
    /// Annealing result.
    Annealing(AnnealingResult),
    /// Photonic result.
    Photonic(PhotonicResult),
    /// Analog-Hamiltonian simulation result.
    AnalogHamiltonian(AnalogHamiltonianResult),
}

impl StructuredResult {
    /// Metadata of the task that produced this result.
    pub fn metadata(&self) -> &ResultMetadata {
        match self {
            Self::GateModel(r) => &r.metadata,
            Self::Annealing(r) => &r.metadata,
            Self::Photonic(r) => &r.metadata,
            Self::AnalogHamiltonian(r) => &r.metadata,
        }
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut ResultMetadata {
        match self {
            Self::GateModel(r) => &mut r.metadata,
            Self::Annealing(r) => &mut r.metadata,
            Self::Photonic(r) => &mut r.metadata,
            Self::AnalogHamiltonian(r) => &mut r.metadata,
        }
    }

    /// Borrow the gate-model result, if this is one.
    pub fn as_gate_model(&self) -> Option<&GateModelResult> {
        match self {
            Self::GateModel(r) => Some(r),
            _ => None,
        }
    }

    /// Borrow the annealing result, if this is one.
    pub fn as_annealing(&self) -> Option<&AnnealingResult> {
        match self {
            Self::Annealing(r) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_basic() {
        let mut counts = Counts::new();
        counts.insert("00", 500);
        counts.insert("11", 500);

        assert_eq!(counts.get("00"), 500);
        assert_eq!(counts.get("11"), 500);
        assert_eq!(counts.get("01"), 0);
        assert_eq!(counts.total_shots(), 1000);
    }

    #[test]
    fn test_counts_probabilities() {
        let counts = Counts::from_pairs([("00", 300), ("01", 200), ("10", 300), ("11", 200)]);

        let probs = counts.probabilities();
        assert!((probs["00"] - 0.3).abs() < 1e-10);
        assert!((probs["01"] - 0.2).abs() < 1e-10);
        assert!(Counts::new().probabilities().is_empty());
    }

    #[test]
    fn test_counts_sorted() {
        let counts = Counts::from_pairs([("01", 5), ("00", 9), ("11", 5)]);
        let sorted: Vec<_> = counts.sorted().into_iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(sorted, vec!["00", "01", "11"]);
    }

    #[test]
    fn test_shot_status_codes() {
        assert_eq!(ShotStatus::from_code("Success"), Some(ShotStatus::Success));
        assert_eq!(
            ShotStatus::from_code("Partial Success"),
            Some(ShotStatus::PartialSuccess)
        );
        assert_eq!(ShotStatus::from_code("FAILURE"), Some(ShotStatus::Failure));
        assert_eq!(ShotStatus::from_code("unknown"), None);
    }

    #[test]
    fn test_analog_counts() {
        let result = AnalogHamiltonianResult {
            metadata: ResultMetadata::new("ahs-1", 3),
            measurements: vec![
                ShotMeasurement {
                    status: ShotStatus::Success,
                    pre_sequence: Some(vec![1, 1, 0]),
                    post_sequence: Some(vec![0, 1, 0]),
                },
                ShotMeasurement {
                    status: ShotStatus::Failure,
                    pre_sequence: Some(vec![1, 1, 1]),
                    post_sequence: Some(vec![1, 1, 1]),
                },
                ShotMeasurement {
                    status: ShotStatus::Success,
                    pre_sequence: None,
                    post_sequence: Some(vec![1, 1, 1]),
                },
            ],
        };
        let counts = result.counts();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get("rge"), 1);
    }

    #[test]
    fn test_annealing_helpers() {
        let result = AnnealingResult {
            metadata: ResultMetadata::new("anneal-1", 10),
            problem_type: ProblemType::Ising,
            variable_count: 2,
            records: vec![
                SolutionRecord {
                    ordinal: 0,
                    solution: vec![1, -1],
                    value: -1.0,
                    count: 7,
                },
                SolutionRecord {
                    ordinal: 1,
                    solution: vec![1, 1],
                    value: 2.0,
                    count: 3,
                },
            ],
        };
        assert_eq!(result.lowest_energy().map(|r| r.ordinal), Some(0));
        assert_eq!(result.total_occurrences(), 10);
    }
}
