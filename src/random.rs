//! Seeded random-number generation.
//!
//! Every stochastic operation in the crate takes an explicit `&mut impl Rng`.
//! A run owns exactly one generator so that a fixed seed reproduces the
//! whole search.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Creates the generator for one run.
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Creates a generator from `seed`, or from OS entropy when `None`.
pub fn rng_from_option(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => create_rng(s),
        None => create_rng(rand::random()),
    }
}
