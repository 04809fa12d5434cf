//! Observable descriptors.
//!
//! Only the part of observable algebra the statistics engine needs lives
//! here: how many qubits an observable acts on and its eigenvalues in the
//! computational-basis order used by [`crate::stats::to_base10`] (first
//! factor is the most significant bit).

use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{TaskError, TaskResult};

/// Single-qubit observables with spectrum `{+1, -1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandardObservable {
    /// Pauli X.
    X,
    /// Pauli Y.
    Y,
    /// Pauli Z.
    Z,
    /// Hadamard.
    H,
}

/// An observable whose statistics can be requested over a target set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Observable {
    /// Pauli-like single-qubit observable.
    Standard {
        /// Which standard observable.
        kind: StandardObservable,
    },
    /// Single-qubit identity.
    Identity,
    /// Tensor product of single- or multi-qubit factors.
    TensorProduct {
        /// Factors, most significant first.
        factors: Vec<Observable>,
    },
    /// Hermitian matrix with eigenvalues precomputed by the caller.
    Hermitian {
        /// Eigenvalues in computational-basis order; length must be `2^n`.
        eigenvalues: Vec<Complex64>,
    },
}

impl Observable {
    /// Pauli X.
    pub fn x() -> Self {
        Self::Standard {
            kind: StandardObservable::X,
        }
    }

    /// Pauli Y.
    pub fn y() -> Self {
        Self::Standard {
            kind: StandardObservable::Y,
        }
    }

    /// Pauli Z.
    pub fn z() -> Self {
        Self::Standard {
            kind: StandardObservable::Z,
        }
    }

    /// Hadamard.
    pub fn h() -> Self {
        Self::Standard {
            kind: StandardObservable::H,
        }
    }

    /// Tensor product of `factors`.
    pub fn tensor(factors: impl IntoIterator<Item = Observable>) -> Self {
        Self::TensorProduct {
            factors: factors.into_iter().collect(),
        }
    }

    /// Hermitian observable with real eigenvalues.
    pub fn hermitian(eigenvalues: impl IntoIterator<Item = f64>) -> Self {
        Self::Hermitian {
            eigenvalues: eigenvalues
                .into_iter()
                .map(|v| Complex64::new(v, 0.0))
                .collect(),
        }
    }

    /// Check if this is a single-qubit `{+1, -1}` observable.
    pub fn is_standard(&self) -> bool {
        matches!(self, Self::Standard { .. })
    }

    /// Number of qubits the observable acts on.
    pub fn qubit_count(&self) -> TaskResult<usize> {
        match self {
            Self::Standard { .. } | Self::Identity => Ok(1),
            Self::TensorProduct { factors } => {
                if factors.is_empty() {
                    return Err(TaskError::InvalidObservable(
                        "tensor product has no factors".into(),
                    ));
                }
                factors.iter().map(Observable::qubit_count).sum()
            }
            Self::Hermitian { eigenvalues } => {
                let len = eigenvalues.len();
                if len < 2 || !len.is_power_of_two() {
                    return Err(TaskError::InvalidObservable(format!(
                        "hermitian spectrum of length {len} is not a power of two"
                    )));
                }
                Ok(len.trailing_zeros() as usize)
            }
        }
    }

    /// Eigenvalues over the joint computational basis of the targets.
    pub fn eigenvalues(&self) -> TaskResult<Vec<Complex64>> {
        let one = Complex64::new(1.0, 0.0);
        match self {
            Self::Standard { .. } => Ok(vec![one, -one]),
            Self::Identity => Ok(vec![one, one]),
            Self::Hermitian { eigenvalues } => {
                self.qubit_count()?;
                Ok(eigenvalues.clone())
            }
            Self::TensorProduct { factors } => {
                self.qubit_count()?;
                let mut spectrum = vec![one];
                for factor in factors {
                    let inner = factor.eigenvalues()?;
                    spectrum = spectrum
                        .iter()
                        .flat_map(|a| inner.iter().map(move |b| a * b))
                        .collect();
                }
                Ok(spectrum)
            }
        }
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard { kind } => write!(f, "{}", format!("{kind:?}").to_lowercase()),
            Self::Identity => write!(f, "i"),
            Self::TensorProduct { factors } => {
                let names: Vec<String> = factors.iter().map(ToString::to_string).collect();
                write!(f, "{}", names.join(" @ "))
            }
            Self::Hermitian { .. } => write!(f, "hermitian"),
        }
    }
}
