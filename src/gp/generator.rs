//! Random program synthesis.
//!
//! Each output gets a tree with a uniformly drawn number of leaves. The
//! leaf count is split recursively at a uniform point, so every tree is
//! exactly as large as drawn but its shape is random.

use crate::error::{GpError, Result};
use crate::expr::{Assignment, Node, Operator, Program};
use rand::Rng;

/// Side length of the matrices being multiplied.
pub const MATRIX_DIM: usize = 2;

/// Builds random candidate programs over a fixed variable set.
#[derive(Debug, Clone)]
pub struct ProgramGenerator {
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl ProgramGenerator {
    /// Creates a generator over explicit input and output names.
    ///
    /// Both lists must be non-empty and an output may not also be an input.
    pub fn new(inputs: Vec<String>, outputs: Vec<String>) -> Result<Self> {
        if inputs.is_empty() {
            return Err(GpError::InvalidArgument("at least one input variable is required".into()));
        }
        if outputs.is_empty() {
            return Err(GpError::InvalidArgument("at least one output is required".into()));
        }
        if let Some(name) = outputs.iter().find(|o| inputs.contains(o)) {
            return Err(GpError::InvalidArgument(format!(
                "`{name}` is used both as input and output"
            )));
        }
        Ok(Self { inputs, outputs })
    }

    /// Inputs `a1..a4`, `b1..b4` (row-major entries of A and B) and outputs
    /// `c1..c4` (row-major entries of A·B).
    pub fn matmul_2x2() -> Self {
        let cells = MATRIX_DIM * MATRIX_DIM;
        let mut inputs: Vec<String> = (1..=cells).map(|i| format!("a{i}")).collect();
        inputs.extend((1..=cells).map(|i| format!("b{i}")));
        let outputs = (1..=cells).map(|i| format!("c{i}")).collect();
        Self { inputs, outputs }
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Generates one program with between 2 and `max_nodes_per_output`
    /// leaves per output.
    ///
    /// # Errors
    /// [`GpError::InvalidArgument`] if `max_nodes_per_output < 2`.
    pub fn generate<R: Rng>(&self, max_nodes_per_output: usize, rng: &mut R) -> Result<Program> {
        check_max_nodes(max_nodes_per_output)?;

        // Outputs are drawn last-to-first.
        let mut assignments: Vec<Assignment> = self
            .outputs
            .iter()
            .rev()
            .map(|output| {
                let leaves = rng.random_range(2..=max_nodes_per_output);
                Assignment::new(output.clone(), self.random_tree(leaves, rng))
            })
            .collect();
        assignments.reverse();

        Ok(Program::new(self.inputs.clone(), assignments))
    }

    /// Generates `size` independent programs.
    pub fn generate_population<R: Rng>(
        &self,
        size: usize,
        max_nodes_per_output: usize,
        rng: &mut R,
    ) -> Result<Vec<Program>> {
        check_max_nodes(max_nodes_per_output)?;
        (0..size)
            .map(|_| self.generate(max_nodes_per_output, rng))
            .collect()
    }

    /// Builds a tree with exactly `leaves` variable leaves.
    ///
    /// # Panics
    /// Panics if `leaves == 0`.
    pub fn random_tree<R: Rng>(&self, leaves: usize, rng: &mut R) -> Node {
        assert!(leaves > 0, "a tree needs at least one leaf");
        if leaves == 1 {
            return self.random_variable(rng);
        }
        let left_leaves = rng.random_range(1..leaves);
        let left = self.random_tree(left_leaves, rng);
        let right = self.random_tree(leaves - left_leaves, rng);
        Node::binary(Operator::random(rng), left, right)
    }

    /// A leaf referencing a uniformly drawn input.
    pub fn random_variable<R: Rng>(&self, rng: &mut R) -> Node {
        let idx = rng.random_range(0..self.inputs.len());
        Node::Variable(self.inputs[idx].clone())
    }
}

impl Default for ProgramGenerator {
    fn default() -> Self {
        Self::matmul_2x2()
    }
}

fn check_max_nodes(max_nodes_per_output: usize) -> Result<()> {
    if max_nodes_per_output < 2 {
        return Err(GpError::InvalidArgument(format!(
            "max_nodes_per_output must be at least 2, got {max_nodes_per_output}"
        )));
    }
    Ok(())
}
