//! Generation replacement: elitism, culling and repopulation.
//!
//! Both strategies take a population sorted ascending by fitness (best
//! last), keep the `elite_count` best programs unchanged and refill the
//! remaining slots with offspring bred from a pool of parents:
//!
//! - [`Replacement::KillAndRepopulate`]: the pool is everything except the
//!   `kill_count` worst programs; elites stay in the pool.
//! - [`Replacement::ElitesOnly`]: the pool is everything except the elites.
//!
//! Each offspring independently becomes a mutant (one parent, drawn with
//! replacement) with probability `percent_mutation / 100`, and a crossover
//! child of two distinct parents otherwise.

use super::operators::{crossover, mutate};
use crate::error::{GpError, Result};
use crate::expr::Program;
use rand::Rng;

/// Strategy used to build the next generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Replacement {
    /// Elites survive; the worst `percent_kill` are excluded from breeding.
    #[default]
    KillAndRepopulate,
    /// Elites survive; only non-elites breed. Used for long runs.
    ElitesOnly,
}

impl Replacement {
    /// Builds the next population from `sorted` (ascending fitness).
    pub fn next_population<R: Rng>(
        &self,
        sorted: &[Program],
        percent_elite: f64,
        percent_kill: f64,
        percent_mutation: f64,
        rng: &mut R,
    ) -> Result<Vec<Program>> {
        match self {
            Replacement::KillAndRepopulate => {
                kill_and_repopulate(sorted, percent_elite, percent_kill, percent_mutation, rng)
            }
            Replacement::ElitesOnly => next_generation(sorted, percent_elite, percent_mutation, rng),
        }
    }

    /// The programs of `sorted` eligible as parents.
    pub fn breeding_pool<'a>(&self, sorted: &'a [Program], partition: &Partition) -> &'a [Program] {
        match self {
            Replacement::KillAndRepopulate => &sorted[partition.kill_count..],
            Replacement::ElitesOnly => &sorted[..partition.offspring_count()],
        }
    }
}

/// Slot bookkeeping for one generation transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub population_size: usize,
    /// `ceil(percent_elite * n / 100)`
    pub elite_count: usize,
    /// `ceil(percent_kill * n / 100)`
    pub kill_count: usize,
}

impl Partition {
    /// Computes elite and kill counts independently of each other.
    ///
    /// `elite_count + kill_count > population_size` is accepted: the
    /// elites then also sit among the culled programs.
    pub fn new(population_size: usize, percent_elite: f64, percent_kill: f64) -> Result<Self> {
        Ok(Self {
            population_size,
            elite_count: percent_count(percent_elite, population_size)?,
            kill_count: percent_count(percent_kill, population_size)?,
        })
    }

    /// Slots to fill with offspring.
    pub fn offspring_count(&self) -> usize {
        self.population_size - self.elite_count
    }

    pub fn overlaps(&self) -> bool {
        self.elite_count + self.kill_count > self.population_size
    }
}

/// Validates a percentage in `[0, 100]`.
pub fn check_percent(name: &str, percent: f64) -> Result<()> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(GpError::InvalidArgument(format!(
            "{name} must be within [0, 100], got {percent}"
        )));
    }
    Ok(())
}

/// `ceil(percent * n / 100)`, capped at `n`.
pub fn percent_count(percent: f64, n: usize) -> Result<usize> {
    check_percent("percentage", percent)?;
    let count = (percent * n as f64 / 100.0).ceil() as usize;
    Ok(count.min(n))
}

/// Elites, then the `kill` worst are excluded from the breeding pool, then
/// the remaining slots are refilled.
///
/// Returns elites, mutation offspring and crossover offspring, in that
/// order. Offspring fitness is not computed.
pub fn kill_and_repopulate<R: Rng>(
    sorted: &[Program],
    percent_elite: f64,
    percent_kill: f64,
    percent_mutation: f64,
    rng: &mut R,
) -> Result<Vec<Program>> {
    check_percent("percent_mutation", percent_mutation)?;
    let partition = Partition::new(sorted.len(), percent_elite, percent_kill)?;
    if partition.overlaps() {
        log::warn!(
            "elite count {} and kill count {} exceed population size {}",
            partition.elite_count,
            partition.kill_count,
            partition.population_size
        );
    }
    let pool = Replacement::KillAndRepopulate.breeding_pool(sorted, &partition);
    assemble(sorted, &partition, pool, percent_mutation, rng)
}

/// Elites survive and only the non-elite programs breed.
pub fn next_generation<R: Rng>(
    sorted: &[Program],
    percent_elite: f64,
    percent_mutation: f64,
    rng: &mut R,
) -> Result<Vec<Program>> {
    check_percent("percent_mutation", percent_mutation)?;
    let partition = Partition::new(sorted.len(), percent_elite, 0.0)?;
    let pool = Replacement::ElitesOnly.breeding_pool(sorted, &partition);
    assemble(sorted, &partition, pool, percent_mutation, rng)
}

fn assemble<R: Rng>(
    sorted: &[Program],
    partition: &Partition,
    pool: &[Program],
    percent_mutation: f64,
    rng: &mut R,
) -> Result<Vec<Program>> {
    let n = sorted.len();
    let mut next: Vec<Program> = Vec::with_capacity(n);
    next.extend_from_slice(&sorted[n - partition.elite_count..]);
    next.extend(breed(pool, partition.offspring_count(), percent_mutation, rng)?);

    if next.len() != n {
        return Err(GpError::InvalidState(format!(
            "next generation has {} programs, expected {n}",
            next.len()
        )));
    }
    log::debug!(
        "replaced generation: {} elites, {} offspring from a pool of {}",
        partition.elite_count,
        partition.offspring_count(),
        pool.len()
    );
    Ok(next)
}

/// Produces `count` offspring from `pool`: first all mutants, then all
/// crossover children.
pub fn breed<R: Rng>(
    pool: &[Program],
    count: usize,
    percent_mutation: f64,
    rng: &mut R,
) -> Result<Vec<Program>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    check_percent("percent_mutation", percent_mutation)?;
    if pool.is_empty() {
        return Err(GpError::InvalidArgument(format!(
            "breeding pool is empty but {count} offspring are required"
        )));
    }

    let p_mutation = percent_mutation / 100.0;
    let mutation_count = (0..count).filter(|_| rng.random_bool(p_mutation)).count();
    let crossover_count = count - mutation_count;
    if crossover_count > 0 && pool.len() < 2 {
        return Err(GpError::InvalidArgument(format!(
            "crossover needs two distinct parents but the breeding pool holds {}",
            pool.len()
        )));
    }

    let mut offspring = Vec::with_capacity(count);
    for _ in 0..mutation_count {
        let parent = &pool[rng.random_range(0..pool.len())];
        offspring.push(mutate(parent.clone(), rng)?);
    }
    for _ in 0..crossover_count {
        let (i, j) = distinct_pair(pool.len(), rng);
        offspring.push(crossover(&pool[i], &pool[j], rng)?);
    }
    Ok(offspring)
}

/// Two different indices in `0..n`, uniformly. Requires `n >= 2`.
fn distinct_pair<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let i = rng.random_range(0..n);
    let mut j = rng.random_range(0..n - 1);
    if j >= i {
        j += 1;
    }
    (i, j)
}
