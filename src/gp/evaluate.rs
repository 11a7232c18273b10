//! Program execution against concrete integer inputs.

use crate::expr::{Node, Program};
use std::collections::HashMap;

/// Values bound to input variable names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: HashMap<String, i64>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `a1..a4` and `b1..b4` to the row-major entries of `a` and `b`.
    pub fn matmul_2x2(a: &[[i64; 2]; 2], b: &[[i64; 2]; 2]) -> Self {
        let mut bindings = Self::new();
        for (prefix, matrix) in [("a", a), ("b", b)] {
            for (i, value) in matrix.iter().flatten().enumerate() {
                bindings.bind(format!("{prefix}{}", i + 1), *value);
            }
        }
        bindings
    }

    pub fn bind(&mut self, name: impl Into<String>, value: i64) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Evaluates a single tree bottom-up.
///
/// # Panics
/// Panics on a variable with no binding; the variable set of a program is
/// fixed and total by construction.
pub fn evaluate_node(node: &Node, bindings: &Bindings) -> i64 {
    match node {
        Node::Variable(name) => bindings
            .get(name)
            .unwrap_or_else(|| panic!("unbound variable `{name}`")),
        Node::BinaryOp { op, left, right } => {
            op.apply(evaluate_node(left, bindings), evaluate_node(right, bindings))
        }
    }
}

/// Evaluates every assignment, returning one value per output in
/// assignment order.
pub fn evaluate(program: &Program, bindings: &Bindings) -> Vec<i64> {
    program
        .assignments()
        .iter()
        .map(|assignment| evaluate_node(&assignment.expr, bindings))
        .collect()
}
