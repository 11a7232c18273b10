//! Candidate programs: one assignment per output cell.

use super::node::{Node, Operator};
use super::parse::parse_program;
use crate::error::GpError;
use std::fmt;
use std::str::FromStr;

/// `output := expr`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    pub output: String,
    pub expr: Node,
}

impl Assignment {
    pub fn new(output: impl Into<String>, expr: Node) -> Self {
        Self {
            output: output.into(),
            expr,
        }
    }
}

/// An ordered list of output assignments over a fixed set of inputs.
///
/// Outputs never appear as inputs, so assignments are independent of each
/// other and can be evaluated in any order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    inputs: Vec<String>,
    assignments: Vec<Assignment>,
}

impl Program {
    pub fn new(inputs: Vec<String>, assignments: Vec<Assignment>) -> Self {
        Self {
            inputs,
            assignments,
        }
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn assignments_mut(&mut self) -> &mut [Assignment] {
        &mut self.assignments
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Binary-operation nodes summed over every assignment.
    pub fn binop_count(&self) -> usize {
        self.assignments.iter().map(|a| a.expr.binop_count()).sum()
    }

    /// Nodes using `op` summed over every assignment.
    pub fn operator_count(&self, op: Operator) -> usize {
        self.assignments
            .iter()
            .map(|a| a.expr.operator_count(op))
            .sum()
    }
}

/// Renders the program as a Rust-like function, e.g.
///
/// ```text
/// fn f(a1: i64, a2: i64, b1: i64, b2: i64) -> [i64; 1] {
///     let c1 = a1 * b1 + a2 * b2;
///     [c1]
/// }
/// ```
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.inputs.iter().map(|name| format!("{name}: i64")).collect();
        writeln!(
            f,
            "fn f({}) -> [i64; {}] {{",
            params.join(", "),
            self.assignments.len()
        )?;
        for assignment in &self.assignments {
            writeln!(f, "    let {} = {};", assignment.output, assignment.expr)?;
        }
        let outputs: Vec<&str> = self
            .assignments
            .iter()
            .map(|a| a.output.as_str())
            .collect();
        writeln!(f, "    [{}]", outputs.join(", "))?;
        write!(f, "}}")
    }
}

impl FromStr for Program {
    type Err = GpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_program(s)
    }
}
