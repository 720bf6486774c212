//! Seeded synthetic cohorts.
//!
//! Generates Gaussian noise profiles with optional effects over position
//! windows and optional confound contributions. Used for calibration runs,
//! benchmarks and examples where real tractometry data is not at hand.
//!
//! # Example
//!
//! ```ignore
//! use tractometry_stats::synthetic::SyntheticCohort;
//!
//! let cohort = SyntheticCohort::group(20)
//!     .tracts(&["AF_left", "CST_left"])
//!     .points(100)
//!     .effect(0, 40..60, 1.5)
//!     .confound("age", 0.3)
//!     .seed(7)
//!     .build()?;
//! ```

use std::ops::Range;

use rand::SeedableRng;
use rand_distr::{Distribution, Normal, StandardNormal};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::cohort::{Cohort, ConfoundMatrix, MetricTensor};
use crate::error::{Error, Result};
use crate::types::Labels;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Design {
    Group { per_group: usize },
    Correlation { subjects: usize },
}

#[derive(Debug, Clone)]
struct Effect {
    tract: usize,
    positions: Range<usize>,
    size: f64,
}

/// Builder for a synthetic [`Cohort`].
#[derive(Debug, Clone)]
pub struct SyntheticCohort {
    design: Design,
    tracts: Vec<String>,
    n_points: usize,
    baseline: f64,
    noise_sd: f64,
    effects: Vec<Effect>,
    confounds: Vec<(String, f64)>,
    seed: u64,
}

impl SyntheticCohort {
    fn with_design(design: Design) -> Self {
        Self {
            design,
            tracts: vec!["tract_0".to_string()],
            n_points: 100,
            baseline: 0.0,
            noise_sd: 1.0,
            effects: Vec::new(),
            confounds: Vec::new(),
            seed: 0,
        }
    }

    /// Two-group cohort with `per_group` subjects in each group.
    ///
    /// Subjects `0..per_group` form group 0, the rest group 1.
    pub fn group(per_group: usize) -> Self {
        Self::with_design(Design::Group { per_group })
    }

    /// Correlation cohort with a standard normal target.
    pub fn correlation(subjects: usize) -> Self {
        Self::with_design(Design::Correlation { subjects })
    }

    /// Tract names (default: a single `tract_0`).
    pub fn tracts(mut self, names: &[&str]) -> Self {
        self.tracts = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Positions per tract (default: 100).
    pub fn points(mut self, n: usize) -> Self {
        self.n_points = n;
        self
    }

    /// Mean metric value (default: 0).
    pub fn baseline(mut self, value: f64) -> Self {
        self.baseline = value;
        self
    }

    /// Standard deviation of the per-value noise (default: 1).
    pub fn noise_sd(mut self, sd: f64) -> Self {
        self.noise_sd = sd;
        self
    }

    /// Add an effect on `positions` of tract `tract`.
    ///
    /// Group cohorts: group 1 is shifted by `size`. Correlation cohorts: the
    /// metric gains `size · target`.
    pub fn effect(mut self, tract: usize, positions: Range<usize>, size: f64) -> Self {
        self.effects.push(Effect {
            tract,
            positions,
            size,
        });
        self
    }

    /// Add a standard normal confound contributing `slope · value` to every
    /// metric value.
    pub fn confound(mut self, name: &str, slope: f64) -> Self {
        self.confounds.push((name.to_string(), slope));
        self
    }

    /// Seed for all random draws (default: 0).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Generate the cohort.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] for a negative or non-finite noise level
    ///   or an effect on a tract that does not exist
    /// - any cohort validation error, e.g. too few subjects
    pub fn build(&self) -> Result<Cohort> {
        let noise = Normal::new(self.baseline, self.noise_sd)
            .map_err(|e| Error::InvalidConfig(format!("noise distribution: {}", e)))?;
        if let Some(effect) = self.effects.iter().find(|e| e.tract >= self.tracts.len()) {
            return Err(Error::InvalidConfig(format!(
                "effect on tract {} but only {} tracts",
                effect.tract,
                self.tracts.len()
            )));
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);

        let (labels, n) = match self.design {
            Design::Group { per_group } => {
                let groups: Vec<u8> = (0..2 * per_group).map(|i| u8::from(i >= per_group)).collect();
                (Labels::Group(groups), 2 * per_group)
            }
            Design::Correlation { subjects } => {
                let target: Vec<f64> = (0..subjects).map(|_| StandardNormal.sample(&mut rng)).collect();
                (Labels::Target(target), subjects)
            }
        };
        let covariate = labels.as_covariate();

        let rows: Vec<Vec<f64>> = (0..n)
            .map(|_| self.confounds.iter().map(|_| StandardNormal.sample(&mut rng)).collect())
            .collect();
        let confound_shift: Vec<f64> = rows
            .iter()
            .map(|row| row.iter().zip(&self.confounds).map(|(v, (_, slope))| v * slope).sum())
            .collect();

        let mut metrics = MetricTensor::from_fn(self.tracts.len(), self.n_points, n, |_, _, s| {
            noise.sample(&mut rng) + confound_shift[s]
        });
        for effect in &self.effects {
            let end = effect.positions.end.min(self.n_points);
            for position in effect.positions.start.min(end)..end {
                for (value, x) in metrics.profile_mut(effect.tract, position).iter_mut().zip(&covariate) {
                    *value += effect.size * x;
                }
            }
        }

        let subjects: Vec<String> = (0..n).map(|i| format!("sub-{:03}", i + 1)).collect();
        let names = self.confounds.iter().map(|(name, _)| name.clone()).collect();
        let confounds = ConfoundMatrix::from_rows(&subjects, names, &rows)?;

        Cohort::from_parts(subjects, self.tracts.clone(), labels, confounds, metrics)
    }
}
