//! Raw payload to structured result.
//!
//! [`format_result`] is a pure dispatch on the payload paradigm. For
//! shot-based gate-model results the provenance of each measurement view
//! is recorded:
//!
//! | Payload carries | measurements | counts | probabilities |
//! |-----------------|--------------|--------|---------------|
//! | shot outcomes | device | derived | derived |
//! | probabilities only | derived | derived | derived |
//!
//! When both are present the shot outcomes are used.

use rustc_hash::FxHashMap;

use crate::error::{TaskError, TaskResult};
use crate::measurement::{MeasurementSet, Outcome};
use crate::payload::{
    AnalogHamiltonianRaw, AnnealingRaw, GateModelRaw, PhotonicRaw, RawResultPayload,
};
use crate::result::{
    AnalogHamiltonianResult, AnnealingResult, DataSource, GateModelResult, MeasurementProvenance,
    PhotonicResult, ShotMeasurement, ShotStatus, SolutionRecord, StructuredResult,
};
use crate::result_type::{ResultTypeValue, resolve_result_types};
use crate::stats;

/// Turn a decoded payload into its structured result.
pub fn format_result(payload: RawResultPayload) -> TaskResult<StructuredResult> {
    match payload {
        RawResultPayload::GateModel(raw) => format_gate_model(raw).map(StructuredResult::GateModel),
        RawResultPayload::Annealing(raw) => format_annealing(raw).map(StructuredResult::Annealing),
        RawResultPayload::Photonic(raw) => format_photonic(raw).map(StructuredResult::Photonic),
        RawResultPayload::AnalogHamiltonian(raw) => {
            format_analog_hamiltonian(raw).map(StructuredResult::AnalogHamiltonian)
        }
    }
}

/// Format a gate-model payload.
pub fn format_gate_model(mut raw: GateModelRaw) -> TaskResult<GateModelResult> {
    if raw.metadata.shots == 0 {
        return format_analytic(raw);
    }
    let device_rows = raw.measurements.take();

    let declared = raw
        .action
        .as_ref()
        .map(|action| action.declared_result_types())
        .unwrap_or_default();
    let reported = raw.result_types.as_deref().unwrap_or_default();

    let (rows, source) = match (device_rows, &raw.measurement_probabilities) {
        (Some(rows), _) => (rows, DataSource::DeviceReported),
        (None, Some(probabilities)) => (
            stats::synthesize_outcomes_from_probabilities(probabilities, raw.metadata.shots)?,
            DataSource::Derived,
        ),
        (None, None) => {
            return Err(TaskError::MissingMeasurementData(raw.metadata.task_id.clone()));
        }
    };
    // Synthesis may round every bucket down to zero rows.
    if rows.is_empty() && source == DataSource::DeviceReported {
        return Err(TaskError::MalformedPayload(format!(
            "task {} reported {} shots but no outcomes",
            raw.metadata.task_id, raw.metadata.shots
        )));
    }

    let width = infer_width(&rows, raw.measured_qubits.as_deref())
        .or_else(|| probability_width(raw.measurement_probabilities.as_ref()))
        .unwrap_or(0);
    let measured_qubits = raw
        .measured_qubits
        .clone()
        .unwrap_or_else(|| (0..width).collect());
    let set = MeasurementSet::new(rows, measured_qubits)?;

    let counts = stats::count_outcomes(set.rows());
    let probabilities = if set.is_empty() {
        FxHashMap::default()
    } else {
        stats::probabilities_from_counts(&counts, set.shots() as u64)?
    };
    let result_types = resolve_result_types(reported, declared, &set)?;

    Ok(GateModelResult {
        metadata: raw.metadata,
        measured_qubits: set.measured_qubits().to_vec(),
        measurements: Some(set),
        measurement_counts: Some(counts),
        measurement_probabilities: Some(probabilities),
        result_types,
        provenance: Some(MeasurementProvenance {
            measurements: source,
            counts: DataSource::Derived,
            probabilities: DataSource::Derived,
        }),
    })
}

fn infer_width(rows: &[Outcome], measured_qubits: Option<&[usize]>) -> Option<usize> {
    measured_qubits
        .map(<[usize]>::len)
        .or_else(|| rows.first().map(Vec::len))
}

fn probability_width(probabilities: Option<&FxHashMap<String, f64>>) -> Option<usize> {
    probabilities?.keys().next().map(String::len)
}

fn format_analytic(raw: GateModelRaw) -> TaskResult<GateModelResult> {
    let result_types = raw
        .result_types
        .unwrap_or_default()
        .into_iter()
        .map(|entry| match entry.value {
            Some(value) => Ok(ResultTypeValue {
                request: entry.request,
                value,
            }),
            None => Err(TaskError::MalformedPayload(format!(
                "zero-shot result for task {} has no value for {}",
                raw.metadata.task_id, entry.request
            ))),
        })
        .collect::<TaskResult<Vec<_>>>()?;

    Ok(GateModelResult {
        metadata: raw.metadata,
        measurements: None,
        measured_qubits: raw.measured_qubits.unwrap_or_default(),
        measurement_counts: None,
        measurement_probabilities: None,
        result_types,
        provenance: None,
    })
}

/// Format an annealing payload.
pub fn format_annealing(raw: AnnealingRaw) -> TaskResult<AnnealingResult> {
    if raw.solutions.is_empty() {
        return Err(TaskError::EmptySolutionSet);
    }
    let n = raw.solutions.len();
    if raw.values.len() != n {
        return Err(TaskError::MalformedPayload(format!(
            "{n} solutions but {} values",
            raw.values.len()
        )));
    }
    let counts = match raw.solution_counts {
        Some(counts) if counts.len() != n => {
            return Err(TaskError::MalformedPayload(format!(
                "{n} solutions but {} solution counts",
                counts.len()
            )));
        }
        Some(counts) => counts,
        None => vec![1; n],
    };

    let variable_count = raw.variable_count.unwrap_or(raw.solutions[0].len());
    if let Some(i) = raw.solutions.iter().position(|s| s.len() != variable_count) {
        return Err(TaskError::MalformedPayload(format!(
            "solution {i} has {} variables, expected {variable_count}",
            raw.solutions[i].len()
        )));
    }

    let records = raw
        .solutions
        .into_iter()
        .zip(raw.values)
        .zip(counts)
        .enumerate()
        .map(|(ordinal, ((solution, value), count))| SolutionRecord {
            ordinal,
            solution,
            value,
            count,
        })
        .collect();

    Ok(AnnealingResult {
        metadata: raw.metadata,
        problem_type: raw.problem_type,
        variable_count,
        records,
    })
}

/// Format a photonic payload.
pub fn format_photonic(raw: PhotonicRaw) -> TaskResult<PhotonicResult> {
    let shots = raw.measurements.len();
    let per_shot = raw.measurements.first().map_or(0, Vec::len);
    let modes = raw
        .measurements
        .first()
        .and_then(|shot| shot.first())
        .map_or(0, Vec::len);

    for (s, shot) in raw.measurements.iter().enumerate() {
        if shot.len() != per_shot {
            return Err(TaskError::MalformedPayload(format!(
                "shot {s} has {} measurements, expected {per_shot}",
                shot.len()
            )));
        }
        if let Some(m) = shot.iter().position(|modes_read| modes_read.len() != modes) {
            return Err(TaskError::MalformedPayload(format!(
                "shot {s} measurement {m} reads {} modes, expected {modes}",
                shot[m].len()
            )));
        }
    }

    Ok(PhotonicResult {
        metadata: raw.metadata,
        measurements: raw.measurements,
        shape: [shots, per_shot, modes],
    })
}

/// Format an analog-Hamiltonian payload.
pub fn format_analog_hamiltonian(
    raw: AnalogHamiltonianRaw,
) -> TaskResult<AnalogHamiltonianResult> {
    let measurements = raw
        .measurements
        .into_iter()
        .enumerate()
        .map(|(i, shot)| {
            let status = ShotStatus::from_code(&shot.shot_status).ok_or_else(|| {
                TaskError::MalformedPayload(format!(
                    "shot {i} has unknown status {:?}",
                    shot.shot_status
                ))
            })?;
            if let (Some(pre), Some(post)) = (&shot.pre_sequence, &shot.post_sequence) {
                if pre.len() != post.len() {
                    return Err(TaskError::MalformedPayload(format!(
                        "shot {i} has {} pre-sequence sites but {} post-sequence sites",
                        pre.len(),
                        post.len()
                    )));
                }
            }
            Ok(ShotMeasurement {
                status,
                pre_sequence: shot.pre_sequence,
                post_sequence: shot.post_sequence,
            })
        })
        .collect::<TaskResult<Vec<_>>>()?;

    Ok(AnalogHamiltonianResult {
        metadata: raw.metadata,
        measurements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::observable::Observable;
    use crate::payload::AnalogShotRaw;
    use crate::program::{GateModelProgram, TaskSpec};
    use crate::result::{ProblemType, ResultMetadata};
    use crate::result_type::{ReportedResultType, ResultTypeRequest, ResultValue};

    fn gate_raw(shots: u64) -> GateModelRaw {
        GateModelRaw {
            metadata: ResultMetadata::new("t-1", shots),
            measurements: None,
            measurement_probabilities: None,
            measured_qubits: None,
            result_types: None,
            action: None,
        }
    }

    fn ghz_rows() -> Vec<Vec<u8>> {
        vec![vec![0, 0, 0], vec![1, 0, 0], vec![1, 1, 0], vec![1, 1, 1]]
    }

    #[test]
    fn test_gate_model_from_measurements() {
        let raw = GateModelRaw {
            measurements: Some(ghz_rows()),
            measured_qubits: Some(vec![0, 1, 2]),
            action: Some(TaskSpec::GateModelCircuit(
                GateModelProgram::new("OPENQASM 3.0;", 3)
                    .with_result_type(ResultTypeRequest::expectation(Observable::z(), [0]))
                    .with_result_type(ResultTypeRequest::probability(Vec::new())),
            )),
            ..gate_raw(4)
        };
        let result = format_gate_model(raw).unwrap();

        let counts = result.measurement_counts.as_ref().unwrap();
        assert_eq!(counts.len(), 4);
        assert_eq!(counts.get("110"), 1);
        let probs = result.measurement_probabilities.as_ref().unwrap();
        assert!((probs["111"] - 0.25).abs() < 1e-12);

        assert_eq!(result.result_types.len(), 2);
        assert_eq!(result.result_types[0].value.as_scalar(), Some(-0.5));
        assert_eq!(
            result.result_types[1].value.as_slice().unwrap(),
            &[0.25, 0.0, 0.0, 0.0, 0.25, 0.0, 0.25, 0.25]
        );

        let provenance = result.provenance.unwrap();
        assert_eq!(provenance.measurements, DataSource::DeviceReported);
        assert_eq!(provenance.counts, DataSource::Derived);
    }

    #[test]
    fn test_gate_model_from_probabilities() {
        let mut probabilities = FxHashMap::default();
        probabilities.insert("00".to_string(), 0.5);
        probabilities.insert("11".to_string(), 0.5);
        let raw = GateModelRaw {
            measurement_probabilities: Some(probabilities),
            ..gate_raw(10)
        };
        let result = format_gate_model(raw).unwrap();

        assert_eq!(result.measured_qubits, vec![0, 1]);
        assert_eq!(result.measurements.as_ref().unwrap().shots(), 10);
        assert_eq!(result.measurement_counts.as_ref().unwrap().get("11"), 5);
        assert_eq!(result.provenance.unwrap().measurements, DataSource::Derived);
        assert!(result.result_types.is_empty());
    }

    #[test]
    fn test_gate_model_probabilities_round_to_no_shots() {
        // Half-to-even rounds both 0.5 buckets down.
        let mut probabilities = FxHashMap::default();
        probabilities.insert("0".to_string(), 0.5);
        probabilities.insert("1".to_string(), 0.5);
        let raw = GateModelRaw {
            measurement_probabilities: Some(probabilities),
            ..gate_raw(1)
        };
        let result = format_gate_model(raw).unwrap();

        assert_eq!(result.measured_qubits, vec![0]);
        let set = result.measurements.as_ref().unwrap();
        assert!(set.is_empty());
        assert_eq!(set.width(), 1);
        assert_eq!(result.measurement_counts.as_ref().unwrap().len(), 0);
        assert!(result.measurement_probabilities.as_ref().unwrap().is_empty());
        assert_eq!(result.provenance.unwrap().measurements, DataSource::Derived);
    }

    #[test]
    fn test_gate_model_empty_device_rows() {
        let raw = GateModelRaw {
            measurements: Some(Vec::new()),
            ..gate_raw(4)
        };
        assert!(matches!(
            format_gate_model(raw),
            Err(TaskError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_gate_model_missing_data() {
        assert!(matches!(
            format_gate_model(gate_raw(100)),
            Err(TaskError::MissingMeasurementData(id)) if id == "t-1"
        ));
    }

    #[test]
    fn test_gate_model_ragged_rows() {
        let raw = GateModelRaw {
            measurements: Some(vec![vec![0, 1], vec![1]]),
            ..gate_raw(2)
        };
        assert!(matches!(
            format_gate_model(raw),
            Err(TaskError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_reported_values_pass_through() {
        let request = ResultTypeRequest::expectation(Observable::z(), [0]);
        let raw = GateModelRaw {
            measurements: Some(ghz_rows()),
            result_types: Some(vec![
                ReportedResultType {
                    request: request.clone(),
                    value: Some(ResultValue::Scalar(0.125)),
                },
                ReportedResultType {
                    request: ResultTypeRequest::variance(Observable::z(), [0]),
                    value: None,
                },
            ]),
            ..gate_raw(4)
        };
        let result = format_gate_model(raw).unwrap();
        assert_eq!(result.result_types[0].value.as_scalar(), Some(0.125));
        assert_eq!(result.result_types[1].value.as_scalar(), Some(0.75));
    }

    #[test]
    fn test_analytic_result() {
        let request = ResultTypeRequest::expectation(Observable::z(), [0]);
        let raw = GateModelRaw {
            result_types: Some(vec![ReportedResultType {
                request: request.clone(),
                value: Some(ResultValue::Scalar(1.0)),
            }]),
            ..gate_raw(0)
        };
        let result = format_gate_model(raw).unwrap();
        assert!(result.measurements.is_none());
        assert!(result.provenance.is_none());
        assert_eq!(result.result_types[0].request, request);

        let raw = GateModelRaw {
            result_types: Some(vec![ReportedResultType {
                request,
                value: None,
            }]),
            ..gate_raw(0)
        };
        assert!(format_gate_model(raw).is_err());
    }

    fn annealing_raw(counts: Option<Vec<u64>>) -> AnnealingRaw {
        AnnealingRaw {
            metadata: ResultMetadata::new("t-2", 10),
            problem_type: ProblemType::Ising,
            solutions: vec![vec![1, -1], vec![1, 1]],
            values: vec![-1.0, 2.0],
            solution_counts: counts,
            variable_count: None,
        }
    }

    #[test]
    fn test_annealing_default_counts() {
        let result = format_annealing(annealing_raw(None)).unwrap();
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.variable_count, 2);
        assert_eq!(
            result.records.iter().map(|r| r.count).collect::<Vec<_>>(),
            vec![1, 1]
        );
        assert_eq!(result.lowest_energy().unwrap().ordinal, 0);
    }

    #[test]
    fn test_annealing_errors() {
        let empty = AnnealingRaw {
            solutions: vec![],
            values: vec![],
            ..annealing_raw(None)
        };
        assert!(matches!(
            format_annealing(empty),
            Err(TaskError::EmptySolutionSet)
        ));
        assert!(matches!(
            format_annealing(annealing_raw(Some(vec![3]))),
            Err(TaskError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_photonic_shape() {
        let raw = PhotonicRaw {
            metadata: ResultMetadata::new("t-3", 2),
            measurements: vec![vec![vec![0, 1, 2]], vec![vec![1, 0, 0]]],
        };
        assert_eq!(format_photonic(raw).unwrap().shape, [2, 1, 3]);

        let ragged = PhotonicRaw {
            metadata: ResultMetadata::new("t-3", 2),
            measurements: vec![vec![vec![0, 1, 2]], vec![vec![1, 0]]],
        };
        assert!(format_photonic(ragged).is_err());
    }

    #[test]
    fn test_analog_hamiltonian_shots() {
        let raw = AnalogHamiltonianRaw {
            metadata: ResultMetadata::new("t-4", 3),
            measurements: vec![
                AnalogShotRaw {
                    shot_status: "Success".into(),
                    pre_sequence: Some(vec![1, 1, 0]),
                    post_sequence: Some(vec![0, 1, 0]),
                },
                AnalogShotRaw {
                    shot_status: "Partial Success".into(),
                    pre_sequence: Some(vec![1, 1, 1]),
                    post_sequence: None,
                },
                AnalogShotRaw {
                    shot_status: "Failure".into(),
                    pre_sequence: None,
                    post_sequence: None,
                },
            ],
        };
        let result = format_analog_hamiltonian(raw).unwrap();
        assert_eq!(result.measurements[1].status, ShotStatus::PartialSuccess);
        assert!(result.measurements[1].post_sequence.is_none());
        assert!(result.measurements[2].pre_sequence.is_none());
        assert_eq!(result.counts().get("rge"), 1);
    }

    #[test]
    fn test_analog_hamiltonian_unknown_status() {
        let raw = AnalogHamiltonianRaw {
            metadata: ResultMetadata::new("t-4", 1),
            measurements: vec![AnalogShotRaw {
                shot_status: "Exploded".into(),
                pre_sequence: None,
                post_sequence: None,
            }],
        };
        assert!(matches!(
            format_analog_hamiltonian(raw),
            Err(TaskError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_dispatch() {
        let payload = RawResultPayload::Annealing(annealing_raw(Some(vec![4, 6])));
        let result = format_result(payload).unwrap();
        assert_eq!(result.as_annealing().unwrap().total_occurrences(), 10);
        assert_eq!(result.metadata().task_id, "t-2");
    }
}
