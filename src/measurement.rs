//! Per-shot measurement outcomes.
//!
//! A [`MeasurementSet`] is a shots × qubits bit matrix. Column `j` holds the
//! outcome of logical qubit `measured_qubits[j]`; every row has exactly
//! `measured_qubits.len()` entries, each `0` or `1`.

use serde::{Deserialize, Serialize};

use crate::error::{TaskError, TaskResult};

/// One shot outcome, one bit per measured qubit.
pub type Outcome = Vec<u8>;

/// Ordered shot outcomes together with the qubits they were taken on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementSet {
    rows: Vec<Outcome>,
    measured_qubits: Vec<usize>,
}

impl MeasurementSet {
    /// Create a measurement set, checking row widths and bit values.
    pub fn new(rows: Vec<Outcome>, measured_qubits: Vec<usize>) -> TaskResult<Self> {
        let width = measured_qubits.len();
        for (shot, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(TaskError::MalformedPayload(format!(
                    "shot {shot} has {} bits but {width} qubits were measured",
                    row.len()
                )));
            }
            if let Some(bit) = row.iter().find(|&&b| b > 1) {
                return Err(TaskError::MalformedPayload(format!(
                    "shot {shot} contains non-binary value {bit}"
                )));
            }
        }
        Ok(Self {
            rows,
            measured_qubits,
        })
    }

    /// Create a measurement set over qubits `0..width`.
    pub fn with_contiguous_qubits(rows: Vec<Outcome>, width: usize) -> TaskResult<Self> {
        Self::new(rows, (0..width).collect())
    }

    /// Shot outcomes in acquisition order.
    pub fn rows(&self) -> &[Outcome] {
        &self.rows
    }

    /// Logical qubit index of each column.
    pub fn measured_qubits(&self) -> &[usize] {
        &self.measured_qubits
    }

    /// Number of shots.
    pub fn shots(&self) -> usize {
        self.rows.len()
    }

    /// Number of measured qubits (columns).
    pub fn width(&self) -> usize {
        self.measured_qubits.len()
    }

    /// Check if no shots were recorded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
