//! `TractAnalysis` entry point and builder.

use std::time::Instant;

use rand::Rng;
use tracing::{debug, warn};

use crate::analysis::{
    correct_confounds, run_permutations, significance_mask, FweThreshold, PermutationInput,
    PointwiseStats, StatisticEngine,
};
use crate::cohort::Cohort;
use crate::config::{Config, PermutationCount};
use crate::error::{Error, Result};
use crate::result::{aggregate, AnalysisReport, AnalysisWarning, Metadata, TractResult};
use crate::types::CorrectionMethod;

/// Permutation count of the [`TractAnalysis::quick`] preset.
const QUICK_PERMUTATIONS: usize = 500;

/// Main entry point for tract profile analyses.
///
/// Use the builder pattern to configure and run an analysis.
///
/// # Example
///
/// ```ignore
/// use tractometry_stats::{CorrectionMethod, TractAnalysis};
///
/// let report = TractAnalysis::new()
///     .alpha(0.05)
///     .method(CorrectionMethod::ClusterFwe)
///     .seed(42)
///     .run(&cohort, &["AF_left", "CST_left"])?;
///
/// for record in &report.records {
///     println!("{}: min p = {}", record.tract, record.min_p_value);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TractAnalysis {
    config: Config,
}

impl Default for TractAnalysis {
    fn default() -> Self {
        Self::new()
    }
}

impl TractAnalysis {
    /// Create with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Create with a reduced permutation count for tests and exploration.
    ///
    /// Settings:
    /// - 500 permutations (vs 5,000 / 1,000 default)
    pub fn quick() -> Self {
        Self {
            config: Config {
                permutations: PermutationCount::Fixed(QUICK_PERMUTATIONS),
                ..Config::default()
            },
        }
    }

    /// Create from an explicit configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Apply `TRACTSTATS_*` environment overrides to the current configuration.
    pub fn with_env_overrides(mut self) -> Self {
        self.config = self.config.with_env_overrides();
        self
    }

    /// Set the family-wise significance level.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.config.alpha = alpha;
        self
    }

    /// Set a fixed number of permutations.
    pub fn permutations(mut self, n: usize) -> Self {
        self.config.permutations = PermutationCount::Fixed(n);
        self
    }

    /// Set the multiple-comparison correction method.
    pub fn method(mut self, method: CorrectionMethod) -> Self {
        self.config.method = method;
        self
    }

    /// Derive one threshold for all selected tracts together.
    pub fn joint_correction(mut self, joint: bool) -> Self {
        self.config.joint_correction = joint;
        self
    }

    /// Set a deterministic permutation seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the analysis on the selected tracts of a cohort.
    ///
    /// Tracts are reported in selection order; a tract selected twice is
    /// analyzed once.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] for an out-of-range configuration
    /// - [`Error::EmptySelection`] or [`Error::UnknownTract`] for a bad selection
    /// - [`Error::SingularDesign`] if the confounds cannot be regressed out
    pub fn run(&self, cohort: &Cohort, selection: &[&str]) -> Result<AnalysisReport> {
        let start_time = Instant::now();
        self.config.validate()?;
        let tracts = resolve_selection(cohort, selection)?;

        let analysis_type = cohort.analysis_type();
        let alpha = self.config.alpha;
        let permutations = self.config.permutations.resolve(analysis_type);
        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        debug!(
            analysis = ?analysis_type,
            tracts = tracts.len(),
            subjects = cohort.subjects().len(),
            permutations,
            seed,
            "starting tract analysis"
        );

        let corrected = correct_confounds(cohort, &tracts)?;
        let names = cohort.tracts();

        let mut precision_limited = false;
        let mut results = Vec::with_capacity(tracts.len());
        let mut correct = |engine: &StatisticEngine| {
            let outcome = run_permutations(&PermutationInput {
                engine,
                alpha,
                permutations,
                method: self.config.method,
                seed,
            });
            precision_limited |= outcome.precision_limited;
            outcome.threshold
        };

        if self.config.joint_correction {
            let engine = StatisticEngine::new(&corrected.metrics, &tracts, &corrected.labels)?;
            let observed = engine.observed();
            let threshold = correct(&engine);
            for (segment, &tract) in engine.segments().iter().zip(&tracts) {
                let stats = observed.slice(segment.clone());
                results.push(tract_result(&names[tract], stats, threshold, alpha));
            }
        } else {
            for &tract in &tracts {
                debug!(tract = names[tract].as_str(), "testing tract");
                let engine = StatisticEngine::new(&corrected.metrics, &[tract], &corrected.labels)?;
                let threshold = correct(&engine);
                results.push(tract_result(&names[tract], engine.observed(), threshold, alpha));
            }
        }

        let mut warnings = Vec::new();
        if precision_limited {
            warnings.push(AnalysisWarning::InsufficientPermutations {
                permutations,
                alpha,
                minimum: (1.0 / alpha).floor() as usize + 1,
            });
        }
        for result in &results {
            for &position in &result.degenerate {
                warn!(
                    tract = result.name.as_str(),
                    position,
                    "zero variance, statistic undefined"
                );
                warnings.push(AnalysisWarning::DegenerateStatistic {
                    tract: result.name.clone(),
                    position,
                });
            }
        }

        let records = aggregate(&results);
        Ok(AnalysisReport {
            analysis_type,
            method: self.config.method,
            alpha,
            joint_correction: self.config.joint_correction,
            tracts: results,
            records,
            warnings,
            precision_limited,
            metadata: Metadata {
                n_subjects: cohort.subjects().len(),
                n_points: cohort.metrics().n_points(),
                confounds: cohort.confounds().names().to_vec(),
                permutations,
                seed,
                runtime_secs: start_time.elapsed().as_secs_f64(),
            },
        })
    }
}

/// Tract indices in selection order, without repeats.
fn resolve_selection(cohort: &Cohort, selection: &[&str]) -> Result<Vec<usize>> {
    if selection.is_empty() {
        return Err(Error::EmptySelection);
    }
    let mut tracts = Vec::with_capacity(selection.len());
    for name in selection {
        let index = cohort.tract_index(name).ok_or_else(|| Error::UnknownTract {
            name: name.to_string(),
        })?;
        if !tracts.contains(&index) {
            tracts.push(index);
        }
    }
    Ok(tracts)
}

fn tract_result(name: &str, stats: PointwiseStats, threshold: FweThreshold, alpha: f64) -> TractResult {
    let mask = significance_mask(&stats.p_value, &threshold, alpha);
    TractResult {
        name: name.to_string(),
        statistic: stats.statistic,
        p_value: stats.p_value,
        mask,
        threshold,
        degenerate: stats.degenerate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::{ConfoundMatrix, MetricTensor};
    use crate::error::ErrorKind;
    use crate::types::Labels;

    fn cohort() -> Cohort {
        let n = 12;
        let subjects: Vec<String> = (0..n).map(|i| format!("sub-{:02}", i)).collect();
        let groups: Vec<u8> = (0..n).map(|i| (i % 2) as u8).collect();
        let metrics = MetricTensor::from_fn(3, 6, n, |t, p, s| {
            let noise = ((s * 13 + p * 7 + t * 5) % 11) as f64 * 0.05;
            match (t, p) {
                (_, 5) => 0.4,
                (1, 1..=3) => noise + f64::from(groups[s]),
                _ => noise,
            }
        });
        Cohort::from_parts(
            subjects,
            vec!["AF_left".into(), "CST_left".into(), "UF_left".into()],
            Labels::Group(groups),
            ConfoundMatrix::empty(n),
            metrics,
        )
        .unwrap()
    }

    #[test]
    fn test_builder() {
        let analysis = TractAnalysis::quick()
            .alpha(0.01)
            .method(CorrectionMethod::ClusterFwe)
            .joint_correction(true)
            .seed(7);
        let config = analysis.config();
        assert_eq!(config.alpha, 0.01);
        assert_eq!(config.permutations, PermutationCount::Fixed(QUICK_PERMUTATIONS));
        assert_eq!(config.method, CorrectionMethod::ClusterFwe);
        assert!(config.joint_correction);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_selection_errors() {
        let cohort = cohort();
        let analysis = TractAnalysis::quick().seed(1);

        let err = analysis.run(&cohort, &[]).unwrap_err();
        assert!(matches!(err, Error::EmptySelection));

        let err = analysis.run(&cohort, &["AF_left", "ILF_left"]).unwrap_err();
        assert!(matches!(err, Error::UnknownTract { ref name } if name == "ILF_left"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = TractAnalysis::new()
            .alpha(1.5)
            .run(&cohort(), &["AF_left"])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = TractAnalysis::new()
            .permutations(0)
            .run(&cohort(), &["AF_left"])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_report_follows_selection_order() {
        let report = TractAnalysis::quick()
            .seed(3)
            .run(&cohort(), &["UF_left", "CST_left", "UF_left"])
            .unwrap();

        let names: Vec<&str> = report.tracts.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["UF_left", "CST_left"]);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[1].tract, "CST_left");
        assert_eq!(report.metadata.seed, 3);
        assert_eq!(report.metadata.permutations, QUICK_PERMUTATIONS);
    }

    #[test]
    fn test_separated_groups_are_significant() {
        let n = 10;
        let subjects: Vec<String> = (0..n).map(|i| format!("sub-{:02}", i)).collect();
        let groups: Vec<u8> = (0..n).map(|i| u8::from(i >= n / 2)).collect();
        let metrics = MetricTensor::from_fn(1, 4, n, |_, p, s| match p {
            0 => 0.4 + 0.2 * f64::from(groups[s]),
            _ => ((s * 7 + p * 3) % 5) as f64 * 0.05,
        });
        let cohort = Cohort::from_parts(
            subjects,
            vec!["AF_left".into()],
            Labels::Group(groups),
            ConfoundMatrix::empty(n),
            metrics,
        )
        .unwrap();

        let report = TractAnalysis::new()
            .permutations(1_000)
            .seed(5)
            .run(&cohort, &["AF_left"])
            .unwrap();
        let tract = &report.tracts[0];
        assert_eq!(tract.statistic[0], f64::NEG_INFINITY);
        assert_eq!(tract.p_value[0], 0.0);
        assert!(tract.mask[0]);
        assert!(tract.degenerate.is_empty());
        assert!(!report
            .warnings
            .iter()
            .any(|w| matches!(w, AnalysisWarning::DegenerateStatistic { .. })));
    }

    #[test]
    fn test_degenerate_positions_warned() {
        let report = TractAnalysis::quick().seed(3).run(&cohort(), &["AF_left"]).unwrap();
        assert_eq!(report.tracts[0].degenerate, vec![5]);
        assert!(!report.tracts[0].mask[5]);
        assert!(report.warnings.contains(&AnalysisWarning::DegenerateStatistic {
            tract: "AF_left".to_string(),
            position: 5,
        }));
    }

    #[test]
    fn test_unseeded_run_records_seed() {
        let cohort = cohort();
        let report = TractAnalysis::quick().run(&cohort, &["CST_left"]).unwrap();
        let replay = TractAnalysis::quick()
            .seed(report.metadata.seed)
            .run(&cohort, &["CST_left"])
            .unwrap();
        assert_eq!(report.tracts[0].threshold, replay.tracts[0].threshold);
    }

    #[test]
    fn test_joint_over_one_tract_matches_per_tract() {
        let cohort = cohort();
        for method in [CorrectionMethod::AlphaFwe, CorrectionMethod::ClusterFwe] {
            let single = TractAnalysis::quick().method(method).seed(11);
            let joint = single.clone().joint_correction(true);

            let a = single.run(&cohort, &["CST_left"]).unwrap();
            let b = joint.run(&cohort, &["CST_left"]).unwrap();
            assert_eq!(a.tracts[0].threshold, b.tracts[0].threshold);
            assert_eq!(a.tracts[0].mask, b.tracts[0].mask);
            assert_eq!(a.records, b.records);
        }
    }

    #[test]
    fn test_joint_threshold_shared() {
        let report = TractAnalysis::quick()
            .seed(5)
            .joint_correction(true)
            .run(&cohort(), &["AF_left", "CST_left", "UF_left"])
            .unwrap();
        let threshold = report.tracts[0].threshold;
        assert!(report.tracts.iter().all(|t| t.threshold == threshold));
        assert_eq!(report.tracts[2].statistic.len(), 6);
    }

    #[test]
    fn test_precision_warning() {
        let report = TractAnalysis::new()
            .permutations(10)
            .seed(2)
            .run(&cohort(), &["AF_left"])
            .unwrap();
        assert!(report.precision_limited);
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            AnalysisWarning::InsufficientPermutations {
                permutations: 10,
                minimum: 21,
                ..
            }
        )));
    }
}
