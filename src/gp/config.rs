//! GP configuration.
//!
//! [`GpConfig`] holds all parameters that control the search loop.

use super::selection::{check_percent, Replacement};
use crate::error::{GpError, Result};

/// Configuration for the expression search.
///
/// # Defaults
///
/// ```
/// use matmul_gp::gp::GpConfig;
///
/// let config = GpConfig::default();
/// assert_eq!(config.population_size, 400);
/// assert_eq!(config.max_generations, 100);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use matmul_gp::gp::{GpConfig, Replacement};
///
/// let config = GpConfig::default()
///     .with_population_size(200)
///     .with_percent_kill(30.0)
///     .with_replacement(Replacement::ElitesOnly)
///     .with_seed(7);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpConfig {
    /// Number of programs per generation.
    pub population_size: usize,

    /// Number of generations evaluated.
    pub max_generations: usize,

    /// Upper bound on the variable leaves of each generated output tree.
    ///
    /// Must be at least 2 so that every tree holds a binary operation.
    pub max_nodes_per_output: usize,

    /// Percentage (0–100) of the fittest programs copied unchanged.
    pub percent_elite: f64,

    /// Percentage (0–100) of the least fit programs excluded from breeding.
    ///
    /// Ignored by [`Replacement::ElitesOnly`].
    pub percent_kill: f64,

    /// Probability, in percent, that an offspring is a mutant rather than
    /// a crossover child.
    pub percent_mutation: f64,

    /// How the next generation is assembled.
    pub replacement: Replacement,

    /// Whether to evaluate fitness in parallel using rayon.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,

    /// Log a progress line every this many percent of the run.
    ///
    /// Set to 0 to disable progress lines.
    pub log_interval_percent: usize,

    /// Stop as soon as a generation contains an exact solution.
    pub stop_on_solution: bool,

    /// Maximum distance from 1.0 for a fitness to count as exact.
    pub solution_tolerance: f64,
}

impl Default for GpConfig {
    fn default() -> Self {
        Self {
            population_size: 400,
            max_generations: 100,
            max_nodes_per_output: 7,
            percent_elite: 1.0,
            percent_kill: 20.0,
            percent_mutation: 40.0,
            replacement: Replacement::default(),
            parallel: true,
            seed: None,
            log_interval_percent: 5,
            stop_on_solution: false,
            solution_tolerance: 1e-7,
        }
    }
}

impl GpConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the leaf bound for generated trees.
    pub fn with_max_nodes_per_output(mut self, n: usize) -> Self {
        self.max_nodes_per_output = n;
        self
    }

    /// Sets the elite percentage.
    pub fn with_percent_elite(mut self, percent: f64) -> Self {
        self.percent_elite = percent.clamp(0.0, 100.0);
        self
    }

    /// Sets the kill percentage.
    pub fn with_percent_kill(mut self, percent: f64) -> Self {
        self.percent_kill = percent.clamp(0.0, 100.0);
        self
    }

    /// Sets the mutation percentage.
    pub fn with_percent_mutation(mut self, percent: f64) -> Self {
        self.percent_mutation = percent.clamp(0.0, 100.0);
        self
    }

    /// Sets the replacement strategy.
    pub fn with_replacement(mut self, replacement: Replacement) -> Self {
        self.replacement = replacement;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the progress-line interval in percent of the run (0 to disable).
    pub fn with_log_interval_percent(mut self, percent: usize) -> Self {
        self.log_interval_percent = percent.min(100);
        self
    }

    /// Sets whether the run stops at the first exact solution.
    pub fn with_stop_on_solution(mut self, stop: bool) -> Self {
        self.stop_on_solution = stop;
        self
    }

    /// Sets the exact-solution tolerance.
    pub fn with_solution_tolerance(mut self, tolerance: f64) -> Self {
        self.solution_tolerance = tolerance.max(0.0);
        self
    }

    /// Preset for smoke runs: small population, few generations, sequential.
    ///
    /// - Population: 50, Generations: 20
    pub fn quick() -> Self {
        Self {
            population_size: 50,
            max_generations: 20,
            parallel: false,
            ..Self::default()
        }
    }

    /// Preset for long searches with elites-only replacement.
    ///
    /// - Population: 1000, Generations: 1000, 1% elites, 40% mutation
    pub fn long_running() -> Self {
        Self {
            population_size: 1000,
            max_generations: 1000,
            replacement: Replacement::ElitesOnly,
            log_interval_percent: 1,
            ..Self::default()
        }
    }

    /// Generations between two progress lines, or `None` when disabled.
    pub fn log_every(&self) -> Option<usize> {
        if self.log_interval_percent == 0 {
            return None;
        }
        Some((self.max_generations * self.log_interval_percent / 100).max(1))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// [`GpError::InvalidArgument`] naming the first invalid parameter.
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(GpError::InvalidArgument(
                "population_size must be at least 2".into(),
            ));
        }
        if self.max_generations == 0 {
            return Err(GpError::InvalidArgument(
                "max_generations must be at least 1".into(),
            ));
        }
        if self.max_nodes_per_output < 2 {
            return Err(GpError::InvalidArgument(
                "max_nodes_per_output must be at least 2".into(),
            ));
        }
        check_percent("percent_elite", self.percent_elite)?;
        check_percent("percent_kill", self.percent_kill)?;
        check_percent("percent_mutation", self.percent_mutation)?;
        if !(self.solution_tolerance >= 0.0) {
            return Err(GpError::InvalidArgument(
                "solution_tolerance must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GpConfig::default();
        assert_eq!(config.population_size, 400);
        assert_eq!(config.max_generations, 100);
        assert_eq!(config.max_nodes_per_output, 7);
        assert!((config.percent_elite - 1.0).abs() < 1e-10);
        assert!((config.percent_kill - 20.0).abs() < 1e-10);
        assert!((config.percent_mutation - 40.0).abs() < 1e-10);
        assert_eq!(config.replacement, Replacement::KillAndRepopulate);
        assert!(config.parallel);
        assert!(config.seed.is_none());
        assert_eq!(config.log_interval_percent, 5);
        assert!(!config.stop_on_solution);
    }

    #[test]
    fn test_builder_pattern() {
        let config = GpConfig::default()
            .with_population_size(200)
            .with_max_generations(50)
            .with_max_nodes_per_output(5)
            .with_percent_elite(2.0)
            .with_percent_kill(30.0)
            .with_percent_mutation(60.0)
            .with_replacement(Replacement::ElitesOnly)
            .with_parallel(false)
            .with_seed(42)
            .with_stop_on_solution(true);

        assert_eq!(config.population_size, 200);
        assert_eq!(config.max_generations, 50);
        assert_eq!(config.max_nodes_per_output, 5);
        assert!((config.percent_elite - 2.0).abs() < 1e-10);
        assert!((config.percent_kill - 30.0).abs() < 1e-10);
        assert!((config.percent_mutation - 60.0).abs() < 1e-10);
        assert_eq!(config.replacement, Replacement::ElitesOnly);
        assert!(!config.parallel);
        assert_eq!(config.seed, Some(42));
        assert!(config.stop_on_solution);
    }

    #[test]
    fn test_validate_ok() {
        assert!(GpConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_population_too_small() {
        let config = GpConfig::default().with_population_size(1);
        assert!(matches!(config.validate(), Err(GpError::InvalidArgument(_))));
    }

    #[test]
    fn test_validate_zero_generations() {
        let config = GpConfig::default().with_max_generations(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_max_nodes() {
        assert!(GpConfig::default().with_max_nodes_per_output(1).validate().is_err());
        assert!(GpConfig::default().with_max_nodes_per_output(2).validate().is_ok());
    }

    #[test]
    fn test_validate_direct_field_percentages() {
        let mut config = GpConfig::default();
        config.percent_kill = 120.0;
        assert!(config.validate().is_err());
        config.percent_kill = 20.0;
        config.percent_mutation = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clamp_percentages() {
        let config = GpConfig::default()
            .with_percent_elite(-3.0)
            .with_percent_kill(150.0)
            .with_percent_mutation(101.0)
            .with_solution_tolerance(-1.0);

        assert!((config.percent_elite - 0.0).abs() < 1e-10);
        assert!((config.percent_kill - 100.0).abs() < 1e-10);
        assert!((config.percent_mutation - 100.0).abs() < 1e-10);
        assert!((config.solution_tolerance - 0.0).abs() < 1e-15);
    }

    // ---- Log interval ----

    #[test]
    fn test_log_every() {
        assert_eq!(GpConfig::default().log_every(), Some(5));
        assert_eq!(
            GpConfig::default().with_max_generations(10).log_every(),
            Some(1)
        );
        assert_eq!(GpConfig::default().with_log_interval_percent(0).log_every(), None);
        assert_eq!(GpConfig::long_running().log_every(), Some(10));
    }

    // ---- Presets ----

    #[test]
    fn test_preset_quick() {
        let config = GpConfig::quick();
        assert_eq!(config.population_size, 50);
        assert_eq!(config.max_generations, 20);
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_preset_long_running() {
        let config = GpConfig::long_running();
        assert_eq!(config.population_size, 1000);
        assert_eq!(config.max_generations, 1000);
        assert_eq!(config.replacement, Replacement::ElitesOnly);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_preset_chainable() {
        let config = GpConfig::quick().with_population_size(75).with_seed(42);
        assert_eq!(config.population_size, 75);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.max_generations, 20);
    }
}
