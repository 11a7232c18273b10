//! Genetic-programming search for matrix-multiplication formulas.
//!
//! Evolves straight-line integer programs that compute a 2×2 matrix
//! product, looking for formulas that use fewer multiplications than the
//! naive eight.
//!
//! - **Expressions** ([`expr`]): owned expression trees, programs of output
//!   assignments, rendering to and parsing from Rust-like source text.
//! - **Search** ([`gp`]): random generation, evaluation, fitness, mutation
//!   and crossover, elitist replacement and the generation loop.
//!
//! # Example
//!
//! ```no_run
//! use matmul_gp::gp::{FitnessTarget, GpConfig, GpRunner};
//!
//! let config = GpConfig::quick().with_seed(7);
//! let result = GpRunner::run(&config, &FitnessTarget::default())?;
//! if let Some((best, fitness)) = result.best() {
//!     println!("{fitness:.6}\n{best}");
//! }
//! # Ok::<(), matmul_gp::GpError>(())
//! ```

pub mod error;
pub mod expr;
pub mod gp;
pub mod random;

pub use error::{GpError, Result};
