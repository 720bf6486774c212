//! Family-wise error correction by label permutation.
//!
//! Under the null hypothesis the labels are exchangeable between subjects.
//! Each iteration shuffles the labels, recomputes the statistic at every
//! position and keeps one summary of the permuted profile:
//!
//! - `AlphaFwe`: M = max_i |stat_i|
//! - `ClusterFwe`: the longest run of positions with nominal p < alpha
//!
//! The conservative (1-α) quantile of these summaries is the corrected
//! threshold. Taking the maximum over all positions captures the correlation
//! between neighbouring positions, which Bonferroni-style corrections ignore.
//!
//! With joint correction the engine holds the positions of several tracts;
//! each iteration applies one permutation to all of them, so every tract
//! sees the same permuted labeling. Clusters never span a tract boundary.

use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::pointwise::StatisticEngine;
use super::significance::{longest_run, FweThreshold};
use crate::statistics::{iteration_rng, upper_quantile, upper_quantile_counts, PermutedLabels};
use crate::types::{CorrectionMethod, Labels};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Input for the permutation procedure.
#[derive(Debug, Clone)]
pub struct PermutationInput<'a> {
    /// Prepared positions (one tract, or several for joint correction).
    pub engine: &'a StatisticEngine,
    /// Family-wise significance level.
    pub alpha: f64,
    /// Number of permutations.
    pub permutations: usize,
    /// Which null summary to build.
    pub method: CorrectionMethod,
    /// Base seed for the permutation draws.
    pub seed: u64,
}

/// Corrected threshold and how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermutationOutcome {
    /// The corrected threshold.
    pub threshold: FweThreshold,
    /// Number of permutations used.
    pub permutations: usize,
    /// True if `permutations ≤ 1/alpha`, i.e. the quantile falls on the
    /// most extreme permutation and the threshold is imprecise.
    pub precision_limited: bool,
}

/// Whether `permutations` can resolve the (1-α) quantile.
pub fn permutations_sufficient(permutations: usize, alpha: f64) -> bool {
    permutations as f64 > 1.0 / alpha
}

/// Run the permutation procedure and derive the corrected threshold.
///
/// 1. For each iteration i, shuffle the labels with an RNG seeded from
///    `(seed, i)` and recompute the statistic profile
/// 2. Record max |stat| or the longest nominally significant run
/// 3. Take the smallest recorded value at or above the (1-α) quantile
///
/// For `AlphaFwe`, the statistic threshold is converted to a p-value with the
/// same reference distribution as the observed p-values.
pub fn run_permutations(input: &PermutationInput<'_>) -> PermutationOutcome {
    let precision_limited = !permutations_sufficient(input.permutations, input.alpha);
    if precision_limited {
        warn!(
            permutations = input.permutations,
            alpha = input.alpha,
            "too few permutations to resolve the corrected threshold"
        );
    }
    debug!(
        permutations = input.permutations,
        positions = input.engine.n_positions(),
        seed = input.seed,
        method = ?input.method,
        "building permutation null distribution"
    );

    let quantile = 1.0 - input.alpha;
    let threshold = match input.method {
        CorrectionMethod::AlphaFwe => {
            let mut max_stats =
                null_distribution(input.engine, input.permutations, input.seed, max_abs);
            let statistic = upper_quantile(&mut max_stats, quantile);
            FweThreshold::AlphaFwe {
                alpha_fwe: input.engine.reference().p_value(statistic),
                statistic,
            }
        }
        CorrectionMethod::ClusterFwe => {
            let critical = input.engine.reference().critical_statistic(input.alpha);
            let segments = input.engine.segments();
            let mut sizes = null_distribution(input.engine, input.permutations, input.seed, |stats| {
                segments
                    .iter()
                    .map(|segment| longest_run(stats[segment.clone()].iter().map(|s| s.abs() > critical)))
                    .max()
                    .unwrap_or(0)
            });
            FweThreshold::ClusterFwe {
                min_cluster: upper_quantile_counts(&mut sizes, quantile),
            }
        }
    };

    PermutationOutcome {
        threshold,
        permutations: input.permutations,
        precision_limited,
    }
}

fn max_abs(stats: &[f64]) -> f64 {
    stats.iter().map(|x| x.abs()).fold(0.0_f64, f64::max)
}

/// Summaries of `permutations` permuted statistic profiles.
///
/// Iteration i always uses the RNG seeded from `(seed, i)`, so the output is
/// identical with and without the `parallel` feature.
fn null_distribution<T, F>(
    engine: &StatisticEngine,
    permutations: usize,
    seed: u64,
    summarize: F,
) -> Vec<T>
where
    T: Default + Clone + Send,
    F: Fn(&[f64]) -> T + Sync,
{
    let labels = engine.permutable_labels();
    let n_positions = engine.n_positions();

    #[cfg(feature = "parallel")]
    let summaries: Vec<T> = crate::thread_pool::install(|| {
        let mut out = vec![T::default(); permutations];

        out.par_iter_mut()
            .enumerate()
            .map_init(
                || {
                    // Per-worker scratch: permuted labels and statistic profile
                    (PermutedLabels::like(&labels), vec![0.0; n_positions])
                },
                |(permuted, stats), (i, out)| {
                    let mut rng = iteration_rng(seed, i);
                    *out = permuted_summary(engine, &labels, &mut rng, permuted, stats, &summarize);
                },
            )
            .count(); // Force execution

        out
    });

    #[cfg(not(feature = "parallel"))]
    let summaries: Vec<T> = crate::thread_pool::install(|| {
        let mut permuted = PermutedLabels::like(&labels);
        let mut stats = vec![0.0; n_positions];

        (0..permutations)
            .map(|i| {
                let mut rng = iteration_rng(seed, i);
                permuted_summary(engine, &labels, &mut rng, &mut permuted, &mut stats, &summarize)
            })
            .collect()
    });

    summaries
}

fn permuted_summary<T, F>(
    engine: &StatisticEngine,
    labels: &Labels,
    rng: &mut Xoshiro256PlusPlus,
    permuted: &mut PermutedLabels,
    stats: &mut [f64],
    summarize: &F,
) -> T
where
    F: Fn(&[f64]) -> T,
{
    permuted.redraw(labels, rng);
    engine.statistics_into(permuted, stats);
    summarize(stats)
}
