//! Test statistics on one position's values across subjects.
//!
//! Values are centered once; the group t statistic and the Pearson
//! correlation are then computed from the centered values and the
//! (possibly permuted) labeling in a single pass. The permutation loop
//! reuses the same [`CenteredProfile`] for every iteration.

use crate::constants::DEGENERATE_VARIANCE;

/// Values of one position, centered on their mean.
#[derive(Debug, Clone)]
pub struct CenteredProfile {
    centered: Vec<f64>,
    mean: f64,
    sxx: f64,
}

impl CenteredProfile {
    /// Center `values`.
    pub fn new(values: &[f64]) -> Self {
        let n = values.len().max(1) as f64;
        let mean = values.iter().sum::<f64>() / n;
        let centered: Vec<f64> = values.iter().map(|v| v - mean).collect();
        let sxx = centered.iter().map(|c| c * c).sum();
        Self {
            centered,
            mean,
            sxx,
        }
    }

    /// Number of subjects.
    pub fn len(&self) -> usize {
        self.centered.len()
    }

    /// Whether the profile has no values.
    pub fn is_empty(&self) -> bool {
        self.centered.is_empty()
    }

    /// Centered values.
    pub fn centered(&self) -> &[f64] {
        &self.centered
    }

    /// Sum of squared deviations.
    pub fn sum_squares(&self) -> f64 {
        self.sxx
    }

    /// Whether all values are (numerically) identical.
    pub fn is_constant(&self) -> bool {
        if self.centered.is_empty() {
            return true;
        }
        let variance = self.sxx / self.centered.len() as f64;
        variance <= DEGENERATE_VARIANCE * (self.mean * self.mean).max(f64::MIN_POSITIVE)
    }

    /// Pooled-variance two-sample t statistic, `(mean₀ − mean₁) / se`.
    ///
    /// Returns `None` when the statistic is undefined: an empty group, fewer
    /// than three subjects, or a constant profile. Perfectly separated groups
    /// (zero within-group variance, different means) give `±∞`.
    pub fn group_t(&self, groups: &[u8]) -> Option<f64> {
        debug_assert_eq!(groups.len(), self.centered.len());
        let n = self.centered.len();
        if n < 3 || self.is_constant() {
            return None;
        }

        let mut n1 = 0usize;
        let mut s0 = 0.0;
        let mut s1 = 0.0;
        for (&x, &g) in self.centered.iter().zip(groups) {
            if g == 1 {
                n1 += 1;
                s1 += x;
            } else {
                s0 += x;
            }
        }
        let n0 = n - n1;
        if n0 == 0 || n1 == 0 {
            return None;
        }

        let (n0, n1) = (n0 as f64, n1 as f64);
        let m0 = s0 / n0;
        let m1 = s1 / n1;
        // SS_total = SS_within + n0·m0² + n1·m1² for centered values
        let ss_within = (self.sxx - n0 * m0 * m0 - n1 * m1 * m1).max(0.0);
        if ss_within <= DEGENERATE_VARIANCE * self.sxx {
            return Some(f64::INFINITY.copysign(m0 - m1));
        }

        let pooled = ss_within / (n as f64 - 2.0);
        let se = (pooled * (1.0 / n0 + 1.0 / n1)).sqrt();
        Some((m0 - m1) / se)
    }

    /// Pearson correlation with a target given as centered values.
    ///
    /// `target_ss` is the target's sum of squared deviations. Permuting the
    /// centered target does not change it, so callers compute it once.
    /// Returns `None` for a constant profile or constant target.
    pub fn correlation(&self, centered_target: &[f64], target_ss: f64) -> Option<f64> {
        debug_assert_eq!(centered_target.len(), self.centered.len());
        if self.centered.len() < 3 || self.is_constant() || target_ss <= 0.0 {
            return None;
        }
        let sxy: f64 = self
            .centered
            .iter()
            .zip(centered_target)
            .map(|(x, y)| x * y)
            .sum();
        Some((sxy / (self.sxx * target_ss).sqrt()).clamp(-1.0, 1.0))
    }
}

/// Pooled-variance two-sample t statistic for raw values.
pub fn two_sample_t(values: &[f64], groups: &[u8]) -> Option<f64> {
    CenteredProfile::new(values).group_t(groups)
}

/// Pearson correlation between raw values and a raw target.
pub fn pearson_r(values: &[f64], target: &[f64]) -> Option<f64> {
    let target = CenteredProfile::new(target);
    if target.is_constant() {
        return None;
    }
    CenteredProfile::new(values).correlation(target.centered(), target.sum_squares())
}
