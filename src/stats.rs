//! Statistics over shot outcomes.
//!
//! Pure functions: no I/O, no shared state. Bit rows are read big-endian,
//! so column 0 is the most significant bit of a row's basis index and the
//! leftmost character of its bitstring.

use std::borrow::Cow;

use rustc_hash::FxHashMap;

use crate::error::{TaskError, TaskResult};
use crate::measurement::Outcome;
use crate::observable::Observable;
use crate::result::Counts;

/// Render a row as a bitstring in column order.
pub fn bitstring(row: &[u8]) -> String {
    row.iter().map(|&b| if b == 0 { '0' } else { '1' }).collect()
}

/// Parse a bitstring into a row.
pub fn parse_bitstring(bits: &str) -> TaskResult<Outcome> {
    bits.chars()
        .map(|c| match c {
            '0' => Ok(0),
            '1' => Ok(1),
            other => Err(TaskError::MalformedPayload(format!(
                "invalid character {other:?} in bitstring {bits:?}"
            ))),
        })
        .collect()
}

/// Count how often each bitstring occurs.
pub fn count_outcomes(rows: &[Outcome]) -> Counts {
    let mut counts = Counts::new();
    for row in rows {
        counts.insert(bitstring(row), 1);
    }
    counts
}

/// Convert counts to probabilities over `total_shots`.
#[allow(clippy::cast_precision_loss)]
pub fn probabilities_from_counts(
    counts: &Counts,
    total_shots: u64,
) -> TaskResult<FxHashMap<String, f64>> {
    if total_shots == 0 {
        return Err(TaskError::DivisionByZero);
    }
    let total = total_shots as f64;
    Ok(counts
        .iter()
        .map(|(bits, &count)| (bits.clone(), count as f64 / total))
        .collect())
}

/// Rebuild shot rows from per-bitstring probabilities.
///
/// Each bitstring yields `round(p * shots)` identical rows, rounding half to
/// even. The number of rows returned can differ from `shots`; the drift is
/// left as is. Rows are grouped by bitstring in lexicographic order.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn synthesize_outcomes_from_probabilities(
    probabilities: &FxHashMap<String, f64>,
    shots: u64,
) -> TaskResult<Vec<Outcome>> {
    let mut entries: Vec<_> = probabilities.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut rows = Vec::new();
    for (bits, &p) in entries {
        if !(0.0..=1.0).contains(&p) {
            return Err(TaskError::MalformedPayload(format!(
                "probability {p} for {bits} outside [0, 1]"
            )));
        }
        let row = parse_bitstring(bits)?;
        let repeats = (p * shots as f64).round_ties_even() as usize;
        rows.extend(std::iter::repeat_n(row, repeats));
    }
    Ok(rows)
}

/// Project rows onto `targets`, in `targets` order.
///
/// Returns the rows untouched when `targets` is empty or equal to
/// `measured_qubits`.
pub fn select_columns<'a>(
    rows: &'a [Outcome],
    measured_qubits: &[usize],
    targets: &[usize],
) -> TaskResult<Cow<'a, [Outcome]>> {
    if targets.is_empty() || targets == measured_qubits {
        return Ok(Cow::Borrowed(rows));
    }

    let columns = targets
        .iter()
        .map(|&target| {
            measured_qubits
                .iter()
                .position(|&q| q == target)
                .ok_or_else(|| TaskError::TargetNotMeasured {
                    target,
                    measured: measured_qubits.to_vec(),
                })
        })
        .collect::<TaskResult<Vec<_>>>()?;

    Ok(Cow::Owned(
        rows.iter()
            .map(|row| columns.iter().map(|&c| row[c]).collect())
            .collect(),
    ))
}

/// Read a row as a big-endian binary number.
pub fn to_base10(row: &[u8]) -> usize {
    row.iter().fold(0usize, |acc, &bit| (acc << 1) | usize::from(bit & 1))
}

/// Eigenvalue observed on each row for `observable`.
///
/// `rows` must already be restricted to the observable's targets.
pub fn eigen_sample_values(observable: &Observable, rows: &[Outcome]) -> TaskResult<Vec<f64>> {
    let width = rows.first().map_or(0, Vec::len);

    if observable.is_standard() && width <= 1 {
        return Ok(rows
            .iter()
            .map(|row| 1.0 - 2.0 * f64::from(row.first().copied().unwrap_or(0)))
            .collect());
    }

    let qubits = observable.qubit_count()?;
    if !rows.is_empty() && width != qubits {
        return Err(TaskError::InvalidObservable(format!(
            "{observable} acts on {qubits} qubits but {width} targets were selected"
        )));
    }

    let eigenvalues = observable.eigenvalues()?;
    rows.iter()
        .map(|row| {
            eigenvalues
                .get(to_base10(row))
                .map(|e| e.re)
                .ok_or_else(|| {
                    TaskError::InvalidObservable(format!(
                        "{observable} has no eigenvalue for outcome {}",
                        bitstring(row)
                    ))
                })
        })
        .collect()
}

/// Arithmetic mean of `samples` (NaN for no samples).
#[allow(clippy::cast_precision_loss)]
pub fn expectation(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population variance of `samples` (NaN for no samples).
#[allow(clippy::cast_precision_loss)]
pub fn variance(samples: &[f64]) -> f64 {
    let mean = expectation(samples);
    samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / samples.len() as f64
}

/// Dense distribution over the `2^num_qubits` basis states.
///
/// Entry `i` is the fraction of rows whose base-10 value is `i`. All entries
/// are zero when `rows` is empty.
#[allow(clippy::cast_precision_loss)]
pub fn probability_distribution(rows: &[Outcome], num_qubits: usize) -> TaskResult<Vec<f64>> {
    if num_qubits >= usize::BITS as usize {
        return Err(TaskError::InvalidObservable(format!(
            "cannot build a dense distribution over {num_qubits} qubits"
        )));
    }

    let mut buckets = vec![0.0; 1 << num_qubits];
    for row in rows {
        if row.len() != num_qubits {
            return Err(TaskError::MalformedPayload(format!(
                "row of width {} in distribution over {num_qubits} qubits",
                row.len()
            )));
        }
        buckets[to_base10(row)] += 1.0;
    }

    if !rows.is_empty() {
        let total = rows.len() as f64;
        for bucket in &mut buckets {
            *bucket /= total;
        }
    }
    Ok(buckets)
}
