//! Evaluated, fitness-sorted populations.

use super::fitness::FitnessTarget;
use crate::error::{GpError, Result};
use crate::expr::Program;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Computes the fitness of every program, in population order.
///
/// With `parallel` (and the `parallel` feature) programs are scored on the
/// rayon pool; the result order is unaffected.
pub fn evaluate_population(programs: &[Program], target: &FitnessTarget, parallel: bool) -> Vec<f64> {
    if parallel {
        evaluate_parallel(programs, target)
    } else {
        programs.iter().map(|p| target.fitness(p)).collect()
    }
}

#[cfg(feature = "parallel")]
fn evaluate_parallel(programs: &[Program], target: &FitnessTarget) -> Vec<f64> {
    programs.par_iter().map(|p| target.fitness(p)).collect()
}

#[cfg(not(feature = "parallel"))]
fn evaluate_parallel(programs: &[Program], target: &FitnessTarget) -> Vec<f64> {
    programs.iter().map(|p| target.fitness(p)).collect()
}

/// Sorts programs ascending by fitness (worst first, best last).
///
/// The sort is stable: equal scores keep their original relative order.
pub fn sort_by_fitness(programs: Vec<Program>, fitness: Vec<f64>) -> (Vec<Program>, Vec<f64>) {
    let mut pairs: Vec<(Program, f64)> = programs.into_iter().zip(fitness).collect();
    pairs.sort_by(|a, b| a.1.total_cmp(&b.1));
    pairs.into_iter().unzip()
}

/// Programs paired index-for-index with their fitness, sorted ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedPopulation {
    programs: Vec<Program>,
    fitness: Vec<f64>,
}

impl EvaluatedPopulation {
    /// Scores and sorts `programs`.
    pub fn evaluate(programs: Vec<Program>, target: &FitnessTarget, parallel: bool) -> Self {
        let fitness = evaluate_population(&programs, target, parallel);
        let (programs, fitness) = sort_by_fitness(programs, fitness);
        Self { programs, fitness }
    }

    /// Sorts already computed scores.
    ///
    /// # Errors
    /// [`GpError::InvalidArgument`] if the lengths differ.
    pub fn from_scores(programs: Vec<Program>, fitness: Vec<f64>) -> Result<Self> {
        if programs.len() != fitness.len() {
            return Err(GpError::InvalidArgument(format!(
                "{} programs but {} fitness values",
                programs.len(),
                fitness.len()
            )));
        }
        let (programs, fitness) = sort_by_fitness(programs, fitness);
        Ok(Self { programs, fitness })
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    /// Fitness values, ascending, aligned with [`programs`](Self::programs).
    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// The fittest program and its score.
    pub fn best(&self) -> Option<(&Program, f64)> {
        self.programs.last().zip(self.fitness.last().copied())
    }

    /// Programs whose score is within `tolerance` of a perfect 1.0.
    pub fn solutions(&self, tolerance: f64) -> impl Iterator<Item = &Program> {
        self.programs
            .iter()
            .zip(&self.fitness)
            .filter(move |&(_, &f)| (f - 1.0).abs() < tolerance)
            .map(|(p, _)| p)
    }
}
