//! Job specifications.
//!
//! A [`TaskSpec`] is what the user wants run. It is immutable once
//! submitted: the task input builder serializes it into the submission
//! envelope's `action`, and gate-model devices echo it back in their
//! results so declared result types can be recovered.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TaskResult;
use crate::result::ProblemType;
use crate::result_type::ResultTypeRequest;

/// A gate-model circuit in OpenQASM 3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateModelProgram {
    /// OpenQASM 3 source.
    pub source: String,
    /// Number of qubits the circuit uses.
    pub qubit_count: usize,
    /// Declared result types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result_types: Vec<ResultTypeRequest>,
    /// Values for free input parameters.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, f64>,
}

impl GateModelProgram {
    /// Create a program without declared result types.
    pub fn new(source: impl Into<String>, qubit_count: usize) -> Self {
        Self {
            source: source.into(),
            qubit_count,
            result_types: Vec::new(),
            inputs: BTreeMap::new(),
        }
    }

    /// Declare a result type.
    pub fn with_result_type(mut self, request: ResultTypeRequest) -> Self {
        self.result_types.push(request);
        self
    }

    /// Bind an input parameter.
    pub fn with_input(mut self, name: impl Into<String>, value: f64) -> Self {
        self.inputs.insert(name.into(), value);
        self
    }
}

/// An annealing problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnealingProblem {
    /// QUBO or Ising.
    pub problem_type: ProblemType,
    /// Linear coefficients as `(i, coefficient)`.
    #[serde(default)]
    pub linear: Vec<(usize, f64)>,
    /// Quadratic coefficients as `(i, j, coefficient)`.
    #[serde(default)]
    pub quadratic: Vec<(usize, usize, f64)>,
}

impl AnnealingProblem {
    /// Create an empty problem.
    pub fn new(problem_type: ProblemType) -> Self {
        Self {
            problem_type,
            linear: Vec::new(),
            quadratic: Vec::new(),
        }
    }

    /// Add a linear term.
    pub fn with_linear(mut self, i: usize, coefficient: f64) -> Self {
        self.linear.push((i, coefficient));
        self
    }

    /// Add a quadratic term.
    pub fn with_quadratic(mut self, i: usize, j: usize, coefficient: f64) -> Self {
        self.quadratic.push((i, j, coefficient));
        self
    }

    /// Number of variables referenced by any term.
    pub fn variable_count(&self) -> usize {
        let linear = self.linear.iter().map(|&(i, _)| i + 1);
        let quadratic = self.quadratic.iter().map(|&(i, j, _)| i.max(j) + 1);
        linear.chain(quadratic).max().unwrap_or(0)
    }
}

/// A photonic program in Blackbird.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotonicProgram {
    /// Blackbird source.
    pub source: String,
    /// Number of optical modes.
    pub mode_count: usize,
}

/// An analog-Hamiltonian simulation program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogHamiltonianProgram {
    /// Atom positions in metres.
    pub register: Vec<[f64; 2]>,
    /// Driving and shifting fields, in the device's schema.
    pub hamiltonian: serde_json::Value,
}

/// A program in some other intermediate representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrProgram {
    /// IR name, used as the schema header of the action.
    pub format: String,
    /// Serialized program.
    pub source: String,
    /// Number of qubits, if the IR is gate-model.
    #[serde(default)]
    pub qubit_count: usize,
    /// Declared result types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result_types: Vec<ResultTypeRequest>,
}

/// User-authored job definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskSpec {
    /// Gate-model circuit.
    GateModelCircuit(GateModelProgram),
    /// Annealing problem.
    AnnealingProblem(AnnealingProblem),
    /// Photonic program.
    PhotonicProgram(PhotonicProgram),
    /// Analog-Hamiltonian simulation program.
    AnalogHamiltonianProgram(AnalogHamiltonianProgram),
    /// Program in another IR.
    #[serde(rename = "generic_ir")]
    GenericIrProgram(IrProgram),
}

impl TaskSpec {
    /// Short name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GateModelCircuit(_) => "gate_model_circuit",
            Self::AnnealingProblem(_) => "annealing_problem",
            Self::PhotonicProgram(_) => "photonic_program",
            Self::AnalogHamiltonianProgram(_) => "analog_hamiltonian_program",
            Self::GenericIrProgram(_) => "generic_ir",
        }
    }

    /// Whether the task runs on a gate-model device.
    pub fn is_gate_model(&self) -> bool {
        matches!(self, Self::GateModelCircuit(_) | Self::GenericIrProgram(_))
    }

    /// Qubits, variables, modes, or sites the task uses.
    pub fn width(&self) -> usize {
        match self {
            Self::GateModelCircuit(p) => p.qubit_count,
            Self::AnnealingProblem(p) => p.variable_count(),
            Self::PhotonicProgram(p) => p.mode_count,
            Self::AnalogHamiltonianProgram(p) => p.register.len(),
            Self::GenericIrProgram(p) => p.qubit_count,
        }
    }

    /// Result types the spec declares; empty for non-gate-model specs.
    pub fn declared_result_types(&self) -> &[ResultTypeRequest] {
        match self {
            Self::GateModelCircuit(p) => &p.result_types,
            Self::GenericIrProgram(p) => &p.result_types,
            _ => &[],
        }
    }

    /// Schema header name for the serialized action.
    pub fn schema_name(&self) -> &str {
        match self {
            Self::GateModelCircuit(_) => "braket.ir.openqasm.program",
            Self::AnnealingProblem(_) => "braket.ir.annealing.problem",
            Self::PhotonicProgram(_) => "braket.ir.blackbird.program",
            Self::AnalogHamiltonianProgram(_) => "braket.ir.ahs.program",
            Self::GenericIrProgram(p) => &p.format,
        }
    }

    /// Serialize the spec as a submission action.
    pub fn to_action(&self) -> TaskResult<String> {
        let action = serde_json::json!({
            "braketSchemaHeader": {
                "name": self.schema_name(),
                "version": "1"
            },
            "program": self,
        });
        Ok(serde_json::to_string(&action)?)
    }
}
