//! Variance-normalised fitness.
//!
//! `score = 1 - SSE / Σ(t - mean(t))²`. A perfect program scores exactly
//! 1.0; the score is unbounded below. Higher is better.

use super::evaluate::{evaluate, Bindings};
use super::generator::ProgramGenerator;
use crate::error::{GpError, Result};
use crate::expr::Program;

/// Sum of squared deviations of `target` from its mean.
pub fn target_variance(target: &[i64]) -> f64 {
    if target.is_empty() {
        return 0.0;
    }
    let mean = target.iter().map(|&t| t as f64).sum::<f64>() / target.len() as f64;
    target.iter().map(|&t| (t as f64 - mean).powi(2)).sum()
}

/// Scores `predicted` against `target`.
///
/// Pure function of its inputs. `target_variance` must be positive; a
/// constant target divides by zero (see [`FitnessTarget::new`], which
/// rejects it up front).
pub fn score(target: &[i64], predicted: &[i64], target_variance: f64) -> f64 {
    debug_assert_eq!(target.len(), predicted.len(), "output length mismatch");
    let sse: f64 = target
        .iter()
        .zip(predicted)
        .map(|(&t, &p)| (t as f64 - p as f64).powi(2))
        .sum();
    1.0 - sse / target_variance
}

/// The fixed inputs and exact outputs every program is scored against.
#[derive(Debug, Clone)]
pub struct FitnessTarget {
    bindings: Bindings,
    expected: Vec<i64>,
    variance: f64,
}

impl FitnessTarget {
    /// Creates a target from input bindings and the exact outputs.
    ///
    /// # Errors
    /// [`GpError::InvalidArgument`] if `expected` is empty or constant.
    pub fn new(bindings: Bindings, expected: Vec<i64>) -> Result<Self> {
        let variance = target_variance(&expected);
        if !(variance > 0.0) {
            return Err(GpError::InvalidArgument(format!(
                "fitness target {expected:?} has zero variance"
            )));
        }
        Ok(Self {
            bindings,
            expected,
            variance,
        })
    }

    /// Target for `A·B` with both matrices bound row-major.
    pub fn matmul_2x2(a: [[i64; 2]; 2], b: [[i64; 2]; 2]) -> Result<Self> {
        let product = matmul(&a, &b);
        let expected = product.iter().flatten().copied().collect();
        Self::new(Bindings::matmul_2x2(&a, &b), expected)
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn expected(&self) -> &[i64] {
        &self.expected
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Checks that programs from `generator` can be scored against this
    /// target: one expected value per output and a binding for every input.
    ///
    /// # Errors
    /// [`GpError::InvalidArgument`] describing the first mismatch.
    pub fn check_generator(&self, generator: &ProgramGenerator) -> Result<()> {
        if self.expected.len() != generator.outputs().len() {
            return Err(GpError::InvalidArgument(format!(
                "fitness target has {} expected values but programs have {} outputs",
                self.expected.len(),
                generator.outputs().len()
            )));
        }
        if let Some(name) = generator
            .inputs()
            .iter()
            .find(|name| self.bindings.get(name).is_none())
        {
            return Err(GpError::InvalidArgument(format!(
                "fitness target does not bind input `{name}`"
            )));
        }
        Ok(())
    }

    /// Evaluates `program` and scores its outputs.
    pub fn fitness(&self, program: &Program) -> f64 {
        let predicted = evaluate(program, &self.bindings);
        score(&self.expected, &predicted, self.variance)
    }
}

/// `A = [[11, -13], [-5, 7]]`, `B = [[-2, 3], [17, -19]]`.
impl Default for FitnessTarget {
    fn default() -> Self {
        Self {
            bindings: Bindings::matmul_2x2(&DEFAULT_A, &DEFAULT_B),
            expected: vec![-243, 280, 129, -148],
            variance: 175_913.0,
        }
    }
}

pub const DEFAULT_A: [[i64; 2]; 2] = [[11, -13], [-5, 7]];
pub const DEFAULT_B: [[i64; 2]; 2] = [[-2, 3], [17, -19]];

fn matmul(a: &[[i64; 2]; 2], b: &[[i64; 2]; 2]) -> [[i64; 2]; 2] {
    let mut c = [[0i64; 2]; 2];
    for (i, row) in c.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..2).fold(0i64, |acc, k| acc.wrapping_add(a[i][k].wrapping_mul(b[k][j])));
        }
    }
    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Assignment, Node};

    fn naive_product() -> Program {
        let inputs = ["a1", "a2", "a3", "a4", "b1", "b2", "b3", "b4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let cell = |a: &str, b: &str, c: &str, d: &str| {
            Node::add(
                Node::mul(Node::var(a), Node::var(b)),
                Node::mul(Node::var(c), Node::var(d)),
            )
        };
        Program::new(
            inputs,
            vec![
                Assignment::new("c1", cell("a1", "b1", "a2", "b3")),
                Assignment::new("c2", cell("a1", "b2", "a2", "b4")),
                Assignment::new("c3", cell("a3", "b1", "a4", "b3")),
                Assignment::new("c4", cell("a3", "b2", "a4", "b4")),
            ],
        )
    }

    #[test]
    fn test_default_target_matches_product() {
        let computed = FitnessTarget::matmul_2x2(DEFAULT_A, DEFAULT_B).unwrap();
        let default = FitnessTarget::default();
        assert_eq!(computed.expected(), &[-243, 280, 129, -148]);
        assert_eq!(computed.expected(), default.expected());
        assert_eq!(computed.bindings(), default.bindings());
        assert!((computed.variance() - default.variance()).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_score() {
        let target = [-243, 280, 129, -148];
        let v = target_variance(&target);
        assert_eq!(score(&target, &target, v), 1.0);
    }

    #[test]
    fn test_exact_program_scores_one() {
        let target = FitnessTarget::default();
        assert!((target.fitness(&naive_product()) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_prediction_is_negative() {
        let target = FitnessTarget::default();
        let s = score(target.expected(), &[0, 0, 0, 0], target.variance());
        // SSE = 175994, variance = 175913
        assert!(s < 0.0, "expected negative score, got {s}");
        assert!(s > -0.01, "expected small magnitude, got {s}");
    }

    #[test]
    fn test_score_is_pure() {
        let target = [3, -1, 4, 1];
        let predicted = [2, 7, -1, 8];
        let v = target_variance(&target);
        let first = score(&target, &predicted, v);
        for _ in 0..10 {
            assert_eq!(score(&target, &predicted, v), first);
        }
    }

    #[test]
    fn test_worse_predictions_score_lower() {
        let target = [1, 2, 3, 4];
        let v = target_variance(&target);
        assert_eq!(v, 5.0);
        let close = score(&target, &[1, 2, 3, 5], v);
        let far = score(&target, &[10, -20, 30, -40], v);
        assert!((close - 0.8).abs() < 1e-12);
        assert!(far < close);
        assert!(far < -100.0);
    }

    #[test]
    fn test_overflowing_target_matches_wrapping_evaluation() {
        let a = [[i64::MAX, 3], [-7, i64::MIN + 1]];
        let b = [[2, 5], [11, i64::MAX]];
        let target = FitnessTarget::matmul_2x2(a, b).unwrap();
        assert_eq!(target.fitness(&naive_product()), 1.0);
    }

    #[test]
    fn test_check_generator() {
        let generator = ProgramGenerator::matmul_2x2();
        assert!(FitnessTarget::default().check_generator(&generator).is_ok());

        let short = FitnessTarget::new(
            Bindings::matmul_2x2(&DEFAULT_A, &DEFAULT_B),
            vec![-243, 280, 129],
        )
        .unwrap();
        assert!(matches!(
            short.check_generator(&generator),
            Err(GpError::InvalidArgument(_))
        ));

        let mut only_x = Bindings::new();
        only_x.bind("x", 1);
        let unbound = FitnessTarget::new(only_x, vec![1, 2, 3, 4]).unwrap();
        match unbound.check_generator(&generator) {
            Err(GpError::InvalidArgument(message)) => {
                assert!(message.contains("`a1`"), "{message}")
            }
            other => panic!("expected invalid argument, got {other:?}"),
        }
    }

    #[test]
    fn test_constant_target_rejected() {
        let result = FitnessTarget::new(Bindings::new(), vec![5, 5, 5, 5]);
        assert!(matches!(result, Err(GpError::InvalidArgument(_))));
        assert!(FitnessTarget::new(Bindings::new(), vec![]).is_err());
        assert!(FitnessTarget::matmul_2x2([[0, 0], [0, 0]], [[1, 2], [3, 4]]).is_err());
    }
}
