//! Random label permutations with counter-based seeding.
//!
//! Every permutation iteration gets its own RNG seeded from the run seed and
//! the iteration index. A given iteration therefore draws the same
//! permutation no matter which worker thread executes it, and the whole
//! null distribution is reproducible from the run seed alone.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::types::Labels;

/// Counter-based RNG seed generation using SplitMix64.
///
/// Stateless mixing of a base seed and a counter into a well-distributed
/// 64-bit seed, avoiding the correlation of `base + counter` seeding.
#[inline]
pub fn counter_rng_seed(base_seed: u64, counter: u64) -> u64 {
    // SplitMix64, see https://xoshiro.di.unimi.it/splitmix64.c
    let mut z = base_seed.wrapping_add(counter.wrapping_mul(0x9e3779b97f4a7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// RNG for one permutation iteration.
pub fn iteration_rng(base_seed: u64, iteration: usize) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(base_seed, iteration as u64))
}

/// Shuffle `source` into `out` (uniform random permutation).
///
/// # Panics
///
/// Panics if `out.len() != source.len()`.
pub fn permute_into<T: Copy, R: Rng + ?Sized>(source: &[T], rng: &mut R, out: &mut [T]) {
    assert_eq!(
        out.len(),
        source.len(),
        "Output buffer must have same length as input data"
    );
    out.copy_from_slice(source);
    out.shuffle(rng);
}

/// Reusable buffer holding one permuted copy of a labeling.
#[derive(Debug, Clone)]
pub enum PermutedLabels {
    /// Shuffled group assignment.
    Group(Vec<u8>),
    /// Shuffled target values.
    Target(Vec<f64>),
}

impl PermutedLabels {
    /// Allocate a buffer shaped like `labels`.
    pub fn like(labels: &Labels) -> Self {
        match labels {
            Labels::Group(g) => PermutedLabels::Group(g.clone()),
            Labels::Target(t) => PermutedLabels::Target(t.clone()),
        }
    }

    /// Overwrite the buffer with a fresh permutation of `labels`.
    pub fn redraw<R: Rng + ?Sized>(&mut self, labels: &Labels, rng: &mut R) {
        match (self, labels) {
            (PermutedLabels::Group(out), Labels::Group(src)) => permute_into(src, rng, out),
            (PermutedLabels::Target(out), Labels::Target(src)) => permute_into(src, rng, out),
            (buffer, labels) => {
                *buffer = PermutedLabels::like(labels);
                buffer.redraw(labels, rng);
            }
        }
    }
}
