//! Genetic-programming search for matrix-product formulas.
//!
//! Candidate programs compute the four entries of a 2×2 matrix product from
//! the eight input entries using `+`, `-` and `*`. The search evolves a
//! population of such programs against a fixed numeric example.
//!
//! # Key Types
//!
//! - [`ProgramGenerator`]: random initial programs
//! - [`FitnessTarget`]: variance-normalised scoring against known outputs
//! - [`EvaluatedPopulation`]: programs sorted ascending by fitness
//! - [`GpConfig`]: run parameters (population size, percentages, presets)
//! - [`GpRunner`]: executes the generation loop
//! - [`GpResult`]: final population, exact solutions and statistics
//!
//! # Submodules
//!
//! - [`operators`]: index-addressed subtree replacement, mutation, crossover
//! - [`selection`]: elitism, culling and repopulation strategies
//!
//! # References
//!
//! - Koza (1992), *Genetic Programming: On the Programming of Computers by
//!   Means of Natural Selection*
//! - Strassen (1969), *Gaussian Elimination is not Optimal*

mod config;
pub mod evaluate;
pub mod fitness;
mod generator;
pub mod operators;
mod population;
mod runner;
pub mod selection;

pub use config::GpConfig;
pub use evaluate::{evaluate, evaluate_node, Bindings};
pub use fitness::{score, target_variance, FitnessTarget};
pub use generator::{ProgramGenerator, MATRIX_DIM};
pub use operators::{crossover, mutate, mutate_in_place, replace_subtree};
pub use population::{evaluate_population, sort_by_fitness, EvaluatedPopulation};
pub use runner::{GenerationStats, GpResult, GpRunner};
pub use selection::{kill_and_repopulate, next_generation, Partition, Replacement};
