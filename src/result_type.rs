//! Requested result types and their values.
//!
//! A circuit declares which statistics it wants (probability, sample,
//! expectation, variance, ...). For shot-based results those statistics are
//! computed client-side from the measurement matrix; each request is
//! evaluated on its own, in request order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TaskError, TaskResult};
use crate::measurement::MeasurementSet;
use crate::observable::Observable;
use crate::stats;

/// Kind of statistic requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultTypeKind {
    /// Dense probability distribution over the targets.
    Probability,
    /// Eigenvalue observed on every shot.
    Sample,
    /// Mean of the sampled eigenvalues.
    Expectation,
    /// Variance of the sampled eigenvalues.
    Variance,
    /// Full state vector (analytic results only).
    StateVector,
    /// Density matrix (analytic results only).
    DensityMatrix,
    /// Selected amplitudes (analytic results only).
    Amplitude,
}

impl ResultTypeKind {
    /// Check if the kind needs an observable.
    pub fn requires_observable(self) -> bool {
        matches!(self, Self::Sample | Self::Expectation | Self::Variance)
    }
}

impl fmt::Display for ResultTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Probability => "probability",
            Self::Sample => "sample",
            Self::Expectation => "expectation",
            Self::Variance => "variance",
            Self::StateVector => "statevector",
            Self::DensityMatrix => "densitymatrix",
            Self::Amplitude => "amplitude",
        };
        f.write_str(name)
    }
}

/// A declared result type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTypeRequest {
    /// Statistic requested.
    pub kind: ResultTypeKind,
    /// Observable for sample, expectation, and variance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observable: Option<Observable>,
    /// Target qubits; empty means all measured qubits.
    #[serde(default)]
    pub targets: Vec<usize>,
}

impl ResultTypeRequest {
    /// Probability distribution over `targets`.
    pub fn probability(targets: impl Into<Vec<usize>>) -> Self {
        Self {
            kind: ResultTypeKind::Probability,
            observable: None,
            targets: targets.into(),
        }
    }

    /// Per-shot eigenvalue samples of `observable`.
    pub fn sample(observable: Observable, targets: impl Into<Vec<usize>>) -> Self {
        Self::with_observable(ResultTypeKind::Sample, observable, targets)
    }

    /// Expectation value of `observable`.
    pub fn expectation(observable: Observable, targets: impl Into<Vec<usize>>) -> Self {
        Self::with_observable(ResultTypeKind::Expectation, observable, targets)
    }

    /// Variance of `observable`.
    pub fn variance(observable: Observable, targets: impl Into<Vec<usize>>) -> Self {
        Self::with_observable(ResultTypeKind::Variance, observable, targets)
    }

    fn with_observable(
        kind: ResultTypeKind,
        observable: Observable,
        targets: impl Into<Vec<usize>>,
    ) -> Self {
        Self {
            kind,
            observable: Some(observable),
            targets: targets.into(),
        }
    }

    fn required_observable(&self) -> TaskResult<&Observable> {
        self.observable
            .as_ref()
            .ok_or_else(|| TaskError::MissingObservable(self.kind.to_string()))
    }
}

impl fmt::Display for ResultTypeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.observable {
            Some(obs) => write!(f, "{}({obs}, {:?})", self.kind, self.targets),
            None => write!(f, "{}({:?})", self.kind, self.targets),
        }
    }
}

/// Computed value of a result type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ResultValue {
    /// Single real number (expectation, variance).
    Scalar(f64),
    /// One real number per shot (sample).
    Vector(Vec<f64>),
    /// Dense distribution over `2^n` basis states (probability).
    Distribution(Vec<f64>),
    /// Device-computed value passed through as-is.
    Raw(serde_json::Value),
}

impl ResultValue {
    /// Scalar value, if this is one.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Vector or distribution entries, if this is one.
    pub fn as_slice(&self) -> Option<&[f64]> {
        match self {
            Self::Vector(v) | Self::Distribution(v) => Some(v),
            _ => None,
        }
    }
}

/// A request together with its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTypeValue {
    /// The request.
    #[serde(rename = "type")]
    pub request: ResultTypeRequest,
    /// Its value.
    pub value: ResultValue,
}

/// A result type as echoed by the backend, possibly without a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedResultType {
    /// The request.
    #[serde(rename = "type")]
    pub request: ResultTypeRequest,
    /// Device-computed value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ResultValue>,
}

/// Compute one result type from shot data.
pub fn calculate_result_type(
    request: &ResultTypeRequest,
    measurements: &MeasurementSet,
) -> TaskResult<ResultTypeValue> {
    let rows = measurements.rows();
    let measured = measurements.measured_qubits();

    let value = match request.kind {
        ResultTypeKind::Probability => {
            let selected = stats::select_columns(rows, measured, &request.targets)?;
            let width = if request.targets.is_empty() {
                measured.len()
            } else {
                request.targets.len()
            };
            ResultValue::Distribution(stats::probability_distribution(&selected, width)?)
        }
        ResultTypeKind::Sample => ResultValue::Vector(samples(request, measurements)?),
        ResultTypeKind::Expectation => {
            ResultValue::Scalar(stats::expectation(&samples(request, measurements)?))
        }
        ResultTypeKind::Variance => {
            ResultValue::Scalar(stats::variance(&samples(request, measurements)?))
        }
        ResultTypeKind::StateVector | ResultTypeKind::DensityMatrix | ResultTypeKind::Amplitude => {
            return Err(TaskError::UnsupportedResultType(format!(
                "{} cannot be computed from shot measurements",
                request.kind
            )));
        }
    };

    Ok(ResultTypeValue {
        request: request.clone(),
        value,
    })
}

/// Compute every request from shot data, preserving order.
pub fn calculate_result_types(
    requests: &[ResultTypeRequest],
    measurements: &MeasurementSet,
) -> TaskResult<Vec<ResultTypeValue>> {
    requests
        .iter()
        .map(|request| calculate_result_type(request, measurements))
        .collect()
}

/// Resolve the result types of a shot-based result.
///
/// Reported values are kept; reported requests without a value are
/// computed. When the backend reported nothing, the `declared` requests of
/// the submitted program are computed instead; no declared requests yields
/// an empty list.
pub fn resolve_result_types(
    reported: &[ReportedResultType],
    declared: &[ResultTypeRequest],
    measurements: &MeasurementSet,
) -> TaskResult<Vec<ResultTypeValue>> {
    if reported.is_empty() {
        return calculate_result_types(declared, measurements);
    }

    reported
        .iter()
        .map(|entry| match &entry.value {
            Some(value) => Ok(ResultTypeValue {
                request: entry.request.clone(),
                value: value.clone(),
            }),
            None => calculate_result_type(&entry.request, measurements),
        })
        .collect()
}

fn samples(request: &ResultTypeRequest, measurements: &MeasurementSet) -> TaskResult<Vec<f64>> {
    let observable = request.required_observable()?;
    let selected = stats::select_columns(
        measurements.rows(),
        measurements.measured_qubits(),
        &request.targets,
    )?;
    stats::eigen_sample_values(observable, &selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> MeasurementSet {
        MeasurementSet::with_contiguous_qubits(
            vec![vec![0, 0, 0], vec![1, 0, 0], vec![1, 1, 0], vec![1, 1, 1]],
            3,
        )
        .unwrap()
    }

    #[test]
    fn test_probability_over_all_targets() {
        let request = ResultTypeRequest::probability(Vec::new());
        let value = calculate_result_type(&request, &scenario()).unwrap();
        assert_eq!(
            value.value,
            ResultValue::Distribution(vec![0.25, 0.0, 0.0, 0.0, 0.25, 0.0, 0.25, 0.25])
        );
    }

    #[test]
    fn test_probability_over_reordered_targets() {
        // Columns (2, 0): 00, 01, 01, 11
        let value =
            calculate_result_type(&ResultTypeRequest::probability([2, 0]), &scenario()).unwrap();
        assert_eq!(
            value.value,
            ResultValue::Distribution(vec![0.25, 0.5, 0.0, 0.25])
        );
    }

    #[test]
    fn test_sample_expectation_variance_in_order() {
        let requests = vec![
            ResultTypeRequest::sample(Observable::z(), [0]),
            ResultTypeRequest::expectation(Observable::z(), [0]),
            ResultTypeRequest::variance(Observable::z(), [0]),
        ];
        let values = calculate_result_types(&requests, &scenario()).unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(
            values[0].value,
            ResultValue::Vector(vec![1.0, -1.0, -1.0, -1.0])
        );
        assert_eq!(values[1].value.as_scalar(), Some(-0.5));
        assert_eq!(values[2].value.as_scalar(), Some(0.75));
        assert_eq!(values[1].request, requests[1]);
    }

    #[test]
    fn test_missing_observable() {
        let request = ResultTypeRequest {
            kind: ResultTypeKind::Expectation,
            observable: None,
            targets: vec![0],
        };
        let err = calculate_result_type(&request, &scenario()).unwrap_err();
        assert!(matches!(err, TaskError::MissingObservable(kind) if kind == "expectation"));
    }

    #[test]
    fn test_unsupported_kind_is_fatal() {
        let requests = vec![
            ResultTypeRequest::probability([0]),
            ResultTypeRequest {
                kind: ResultTypeKind::StateVector,
                observable: None,
                targets: vec![],
            },
        ];
        let err = calculate_result_types(&requests, &scenario()).unwrap_err();
        assert!(matches!(err, TaskError::UnsupportedResultType(_)));
    }

    #[test]
    fn test_resolve_uses_declared_when_nothing_reported() {
        let declared = vec![ResultTypeRequest::expectation(Observable::z(), [0])];
        let values = resolve_result_types(&[], &declared, &scenario()).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].value.as_scalar(), Some(-0.5));

        assert!(resolve_result_types(&[], &[], &scenario()).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_keeps_reported_values() {
        let reported = vec![
            ReportedResultType {
                request: ResultTypeRequest::expectation(Observable::x(), [1]),
                value: Some(ResultValue::Scalar(0.125)),
            },
            ReportedResultType {
                request: ResultTypeRequest::expectation(Observable::z(), [0]),
                value: None,
            },
        ];
        let values = resolve_result_types(&reported, &[], &scenario()).unwrap();
        assert_eq!(values[0].value.as_scalar(), Some(0.125));
        assert_eq!(values[1].value.as_scalar(), Some(-0.5));
    }

    #[test]
    fn test_request_display() {
        let observable = Observable::tensor([Observable::z(), Observable::x()]);
        let request = ResultTypeRequest::variance(observable, [0, 1]);
        assert_eq!(request.to_string(), "variance(z @ x, [0, 1])");
    }
}
