//! GP search loop execution.
//!
//! [`GpRunner`] orchestrates the complete search:
//! generation → evaluation → sorting → statistics → replacement → repeat.

use super::config::GpConfig;
use super::fitness::FitnessTarget;
use super::generator::ProgramGenerator;
use super::population::EvaluatedPopulation;
use crate::error::Result;
use crate::expr::{Operator, Program};
use crate::random::rng_from_option;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Fitness summary of one evaluated generation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationStats {
    /// Zero-based generation number.
    pub generation: usize,
    pub min: f64,
    pub p10: f64,
    pub mean: f64,
    pub p90: f64,
    pub max: f64,
    /// Multiply counts of the three fittest programs, best last.
    pub top_multiplies: Vec<usize>,
}

impl GenerationStats {
    /// Summarises a sorted population.
    pub fn from_population(generation: usize, population: &EvaluatedPopulation) -> Self {
        let fitness = population.fitness();
        let programs = population.programs();
        let mean = if fitness.is_empty() {
            f64::NAN
        } else {
            fitness.iter().sum::<f64>() / fitness.len() as f64
        };
        Self {
            generation,
            min: fitness.first().copied().unwrap_or(f64::NAN),
            p10: quantile(fitness, 0.1),
            mean,
            p90: quantile(fitness, 0.9),
            max: fitness.last().copied().unwrap_or(f64::NAN),
            top_multiplies: programs[programs.len().saturating_sub(3)..]
                .iter()
                .map(|p| p.operator_count(Operator::Multiply))
                .collect(),
        }
    }
}

impl fmt::Display for GenerationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {}: min {:.4} p10 {:.4} mean {:.4} p90 {:.4} max {:.4} multiplies {:?}",
            self.generation, self.min, self.p10, self.mean, self.p90, self.max, self.top_multiplies
        )
    }
}

/// Linear-interpolated quantile of ascending `sorted`.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Result of a search run.
#[derive(Debug, Clone)]
pub struct GpResult {
    /// The last evaluated generation, sorted ascending by fitness.
    pub population: EvaluatedPopulation,

    /// Statistics of every evaluated generation, in order.
    pub history: Vec<GenerationStats>,

    /// Distinct exact solutions seen during the run, in discovery order.
    pub solutions: Vec<Program>,

    /// Number of generations evaluated.
    pub generations: usize,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// Generation in which the first exact solution appeared.
    pub solved_at: Option<usize>,
}

impl GpResult {
    /// The fittest program of the final generation and its score.
    pub fn best(&self) -> Option<(&Program, f64)> {
        self.population.best()
    }
}

/// Executes the search loop.
///
/// # Usage
///
/// ```no_run
/// use matmul_gp::gp::{FitnessTarget, GpConfig, GpRunner};
///
/// let config = GpConfig::default().with_seed(42);
/// let result = GpRunner::run(&config, &FitnessTarget::default())?;
/// for solution in &result.solutions {
///     println!("{solution}");
/// }
/// # Ok::<(), matmul_gp::GpError>(())
/// ```
pub struct GpRunner;

impl GpRunner {
    /// Runs the search.
    ///
    /// # Errors
    /// [`GpError::InvalidArgument`](crate::GpError::InvalidArgument) if the
    /// configuration is invalid, the target does not fit 2×2 programs, or a
    /// breeding pool is too small.
    pub fn run(config: &GpConfig, target: &FitnessTarget) -> Result<GpResult> {
        Self::run_with_cancel(config, target, None)
    }

    /// Runs the search with an optional cancellation token.
    ///
    /// The flag is checked after each generation is evaluated; the run then
    /// returns that generation.
    pub fn run_with_cancel(
        config: &GpConfig,
        target: &FitnessTarget,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<GpResult> {
        Self::run_with_observer(config, target, cancel, |_| {})
    }

    /// Runs the search, handing the statistics of every generation to
    /// `observer`.
    pub fn run_with_observer<F>(
        config: &GpConfig,
        target: &FitnessTarget,
        cancel: Option<Arc<AtomicBool>>,
        mut observer: F,
    ) -> Result<GpResult>
    where
        F: FnMut(&GenerationStats),
    {
        config.validate()?;
        let generator = ProgramGenerator::matmul_2x2();
        target.check_generator(&generator)?;
        let mut rng = rng_from_option(config.seed);
        let log_every = config.log_every();

        log::info!(
            "starting search: population {}, generations {}, {:?}",
            config.population_size,
            config.max_generations,
            config.replacement
        );

        // 1. Initial population
        let initial = generator.generate_population(
            config.population_size,
            config.max_nodes_per_output,
            &mut rng,
        )?;
        let mut population = EvaluatedPopulation::evaluate(initial, target, config.parallel);

        let mut history = Vec::with_capacity(config.max_generations);
        let mut solutions = Vec::new();
        let mut seen = HashSet::new();
        let mut solved_at = None;
        let mut cancelled = false;
        let mut generation = 0;

        // 2. Search loop
        loop {
            let found = collect_solutions(
                &population,
                config.solution_tolerance,
                &mut seen,
                &mut solutions,
            );
            if found > 0 {
                log::info!("generation {generation}: {found} new exact solution(s)");
                solved_at.get_or_insert(generation);
            }

            let stats = GenerationStats::from_population(generation, &population);
            let last = generation + 1 == config.max_generations;
            if log_every.is_some_and(|every| generation % every == 0 || last) {
                log::info!("{stats}");
            } else {
                log::debug!("{stats}");
            }
            observer(&stats);
            history.push(stats);
            generation += 1;

            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    log::info!("search cancelled after {generation} generation(s)");
                    break;
                }
            }
            if config.stop_on_solution && solved_at.is_some() {
                break;
            }
            if last {
                break;
            }

            // 3. Replacement
            let next = config.replacement.next_population(
                population.programs(),
                config.percent_elite,
                config.percent_kill,
                config.percent_mutation,
                &mut rng,
            )?;
            population = EvaluatedPopulation::evaluate(next, target, config.parallel);
        }

        log::info!(
            "search finished after {generation} generation(s), {} distinct solution(s)",
            solutions.len()
        );

        Ok(GpResult {
            population,
            history,
            solutions,
            generations: generation,
            cancelled,
            solved_at,
        })
    }
}

/// Appends exact solutions not seen before, keyed by their rendered text.
/// Returns how many were added.
fn collect_solutions(
    population: &EvaluatedPopulation,
    tolerance: f64,
    seen: &mut HashSet<String>,
    solutions: &mut Vec<Program>,
) -> usize {
    let before = solutions.len();
    for program in population.solutions(tolerance) {
        if seen.insert(program.to_string()) {
            solutions.push(program.clone());
        }
    }
    solutions.len() - before
}

// ============================================================================
// Tests
// ============================================================================
