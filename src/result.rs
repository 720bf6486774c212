//! Analysis result types and per-tract summaries.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::analysis::{contiguous_runs, FweThreshold};
use crate::types::{AnalysisType, CorrectionMethod};

/// Complete result of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Group comparison or correlation.
    pub analysis_type: AnalysisType,

    /// Correction method used for every tract.
    pub method: CorrectionMethod,

    /// Family-wise significance level.
    pub alpha: f64,

    /// Whether one threshold was derived jointly for all selected tracts.
    pub joint_correction: bool,

    /// Per-tract statistics, p-values and masks, in selection order.
    pub tracts: Vec<TractResult>,

    /// One summary row per tract, in selection order.
    pub records: Vec<ResultRecord>,

    /// Non-fatal issues found during the run.
    pub warnings: Vec<AnalysisWarning>,

    /// True if the permutation count was too small to resolve the threshold.
    pub precision_limited: bool,

    /// Run parameters needed to reproduce the result.
    pub metadata: Metadata,
}

impl AnalysisReport {
    /// Result for a tract by name.
    pub fn tract(&self, name: &str) -> Option<&TractResult> {
        self.tracts.iter().find(|t| t.name == name)
    }

    /// Whether any position of any tract is significant.
    pub fn any_significant(&self) -> bool {
        self.tracts.iter().any(|t| t.mask.iter().any(|&m| m))
    }
}

/// Statistics and significance along one tract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TractResult {
    /// Tract name.
    pub name: String,

    /// t statistic (group 0 minus group 1) or Pearson r per position.
    pub statistic: Vec<f64>,

    /// Two-sided uncorrected p-value per position.
    pub p_value: Vec<f64>,

    /// Positions passing the corrected threshold.
    pub mask: Vec<bool>,

    /// Corrected threshold applied to this tract.
    pub threshold: FweThreshold,

    /// Positions whose statistic is undefined (zero variance).
    pub degenerate: Vec<usize>,
}

impl TractResult {
    /// Indices of significant positions.
    pub fn significant_positions(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| m.then_some(i))
            .collect()
    }

    /// Contiguous significant areas.
    pub fn significant_areas(&self) -> Vec<Range<usize>> {
        contiguous_runs(&self.mask)
    }

    /// Position and value of the smallest p-value. Ties resolve to the
    /// first position.
    pub fn min_p(&self) -> Option<(usize, f64)> {
        self.p_value
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (i, p)| match best {
                Some((_, best_p)) if p >= best_p => best,
                _ => Some((i, p)),
            })
    }
}

/// Summary row for one tract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Tract name.
    pub tract: String,

    /// `alphaFWE` or `clusterFWE`, depending on the correction method.
    pub threshold: f64,

    /// Smallest uncorrected p-value along the tract (1 for an empty tract).
    pub min_p_value: f64,

    /// Statistic at the position of the smallest p-value.
    pub statistic_at_min_p: f64,

    /// Position of the smallest p-value.
    pub min_p_position: Option<usize>,
}

/// Summarize tract results, one record per tract in the same order.
pub fn aggregate(results: &[TractResult]) -> Vec<ResultRecord> {
    results
        .iter()
        .map(|result| {
            let min = result.min_p();
            ResultRecord {
                tract: result.name.clone(),
                threshold: result.threshold.value(),
                min_p_value: min.map_or(1.0, |(_, p)| p),
                statistic_at_min_p: min.map_or(0.0, |(i, _)| result.statistic[i]),
                min_p_position: min.map(|(i, _)| i),
            }
        })
        .collect()
}

/// Non-fatal issue detected during an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisWarning {
    /// Zero variance at a position: statistic set to 0, p-value to 1.
    DegenerateStatistic {
        /// Tract name.
        tract: String,
        /// Position along the tract.
        position: usize,
    },

    /// Too few permutations to resolve the (1-α) quantile.
    InsufficientPermutations {
        /// Permutations used.
        permutations: usize,
        /// Family-wise significance level.
        alpha: f64,
        /// Smallest permutation count that resolves the quantile.
        minimum: usize,
    },
}

impl AnalysisWarning {
    /// Get a human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            AnalysisWarning::DegenerateStatistic { tract, position } => format!(
                "Tract {} position {}: zero variance, statistic undefined and treated as not significant",
                tract, position
            ),
            AnalysisWarning::InsufficientPermutations {
                permutations,
                alpha,
                minimum,
            } => format!(
                "{} permutations cannot resolve the threshold at alpha = {} (need at least {}); \
                 the corrected threshold is imprecise",
                permutations, alpha, minimum
            ),
        }
    }
}

/// Parameters of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Number of subjects.
    pub n_subjects: usize,
    /// Positions per tract.
    pub n_points: usize,
    /// Confound columns regressed out.
    pub confounds: Vec<String>,
    /// Permutations used per null distribution.
    pub permutations: usize,
    /// Seed of the permutation draws. Replaying with this seed reproduces
    /// every threshold.
    pub seed: u64,
    /// Wall-clock time of the run in seconds.
    pub runtime_secs: f64,
}
