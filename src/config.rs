//! Configuration for tractometry analyses.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{CORRELATION_PERMUTATIONS, DEFAULT_ALPHA, GROUP_PERMUTATIONS};
use crate::error::{Error, Result};
use crate::types::{AnalysisType, CorrectionMethod};

/// Configuration options for [`TractAnalysis`](crate::TractAnalysis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Family-wise significance level (default: 0.05).
    ///
    /// Also the nominal per-position level used to form clusters in
    /// [`CorrectionMethod::ClusterFwe`] mode.
    pub alpha: f64,

    /// Number of label permutations (default: `Auto`).
    pub permutations: PermutationCount,

    /// Multiple-comparison correction (default: `AlphaFwe`).
    pub method: CorrectionMethod,

    /// Correct jointly across all selected tracts instead of per tract (default: false).
    ///
    /// With joint correction one null distribution is built over the
    /// concatenated positions of every selected tract, using the same
    /// permuted labeling for all tracts in each iteration.
    pub joint_correction: bool,

    /// Seed for the permutation draws.
    ///
    /// When `None`, a seed is drawn once per run and recorded in the report.
    pub seed: Option<u64>,
}

/// Number of permutations used to build the null distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PermutationCount {
    /// Mode-dependent default: 5,000 for group comparisons, 1,000 for
    /// correlations (each correlation permutation is more expensive).
    #[default]
    Auto,

    /// Exactly N permutations regardless of analysis type.
    Fixed(usize),
}

impl PermutationCount {
    /// Resolve the permutation count for an analysis type.
    pub fn resolve(&self, analysis: AnalysisType) -> usize {
        match self {
            Self::Auto => match analysis {
                AnalysisType::Group => GROUP_PERMUTATIONS,
                AnalysisType::Correlation => CORRELATION_PERMUTATIONS,
            },
            Self::Fixed(n) => *n,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            permutations: PermutationCount::Auto,
            method: CorrectionMethod::AlphaFwe,
            joint_correction: false,
            seed: None,
        }
    }
}

impl Config {
    /// Check that every option is in range.
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if self.permutations == PermutationCount::Fixed(0) {
            return Err(Error::InvalidConfig(
                "permutation count must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Merge overrides from `TRACTSTATS_*` environment variables.
    ///
    /// Recognized keys: `TRACTSTATS_ALPHA`, `TRACTSTATS_NPERM`,
    /// `TRACTSTATS_METHOD` (`alpha_fwe` or `cluster_fwe`), `TRACTSTATS_JOINT`
    /// and `TRACTSTATS_SEED`. Values that fail to parse are ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| env::var(key).ok())
    }

    /// Merge overrides from an arbitrary key lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(alpha) = parse_override::<f64, _>(&lookup, "TRACTSTATS_ALPHA") {
            self.alpha = alpha;
        }
        if let Some(n) = parse_override::<usize, _>(&lookup, "TRACTSTATS_NPERM") {
            self.permutations = PermutationCount::Fixed(n);
        }
        if let Some(raw) = lookup("TRACTSTATS_METHOD") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "alpha_fwe" | "alphafwe" => self.method = CorrectionMethod::AlphaFwe,
                "cluster_fwe" | "clusterfwe" => self.method = CorrectionMethod::ClusterFwe,
                other => tracing::warn!(value = other, "ignoring unknown TRACTSTATS_METHOD"),
            }
        }
        if let Some(joint) = parse_override::<bool, _>(&lookup, "TRACTSTATS_JOINT") {
            self.joint_correction = joint;
        }
        if let Some(seed) = parse_override::<u64, _>(&lookup, "TRACTSTATS_SEED") {
            self.seed = Some(seed);
        }
        self
    }
}

fn parse_override<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = raw.as_str(), "ignoring unparsable override");
            None
        }
    }
}
