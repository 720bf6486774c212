//! Significance masks from p-values and corrected thresholds.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Corrected threshold produced by the permutation procedure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FweThreshold {
    /// Pointwise threshold on p-values.
    AlphaFwe {
        /// Corrected p-value threshold.
        alpha_fwe: f64,
        /// |statistic| threshold it was derived from.
        statistic: f64,
    },
    /// Minimum length of a run of nominally significant positions.
    ClusterFwe {
        /// Minimum cluster size.
        min_cluster: usize,
    },
}

impl FweThreshold {
    /// Threshold as a single number (`alphaFWE` or `clusterFWE`).
    pub fn value(&self) -> f64 {
        match self {
            FweThreshold::AlphaFwe { alpha_fwe, .. } => *alpha_fwe,
            FweThreshold::ClusterFwe { min_cluster } => *min_cluster as f64,
        }
    }
}

/// Maximal runs of consecutive `true` flags.
pub fn contiguous_runs(flags: &[bool]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, &flag) in flags.iter().enumerate() {
        match (flag, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..flags.len());
    }
    runs
}

/// Length of the longest run of consecutive `true` values.
pub fn longest_run<I>(flags: I) -> usize
where
    I: IntoIterator<Item = bool>,
{
    let mut longest = 0;
    let mut current = 0;
    for flag in flags {
        if flag {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Pointwise mask: `p ≤ alpha_fwe`.
///
/// A p-value of 1 (including undefined statistics) is never significant,
/// and NaN compares false.
pub fn alpha_fwe_mask(p_values: &[f64], alpha_fwe: f64) -> Vec<bool> {
    p_values.iter().map(|&p| p <= alpha_fwe && p < 1.0).collect()
}

/// Cluster mask: runs of `p < alpha` at least `min_cluster` long.
pub fn cluster_fwe_mask(p_values: &[f64], alpha: f64, min_cluster: usize) -> Vec<bool> {
    let nominal: Vec<bool> = p_values.iter().map(|&p| p < alpha).collect();
    let mut mask = vec![false; p_values.len()];
    for run in contiguous_runs(&nominal) {
        if run.len() >= min_cluster {
            mask[run].fill(true);
        }
    }
    mask
}

/// Mask for a tract given its corrected threshold.
///
/// `alpha` is the nominal level used to form clusters.
pub fn significance_mask(p_values: &[f64], threshold: &FweThreshold, alpha: f64) -> Vec<bool> {
    match *threshold {
        FweThreshold::AlphaFwe { alpha_fwe, .. } => alpha_fwe_mask(p_values, alpha_fwe),
        FweThreshold::ClusterFwe { min_cluster } => cluster_fwe_mask(p_values, alpha, min_cluster),
    }
}
