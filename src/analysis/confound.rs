//! Confound removal by linear regression.
//!
//! Each position's values are regressed on `[intercept | protected | confounds]`
//! and only the confound part of the fit is subtracted:
//!
//! ```text
//! y_corrected = y − C·β_C
//! ```
//!
//! The intercept and the protected covariate (the group label in group
//! analyses) stay in the corrected values, so the effect under test is not
//! regressed away. For correlation analyses the target is corrected once
//! with the confound-only design before testing.

use tracing::debug;

use crate::cohort::{Cohort, ConfoundMatrix, MetricTensor};
use crate::error::Result;
use crate::statistics::LeastSquares;
use crate::types::{Labels, Matrix};

/// Regression model removing confound effects from per-subject values.
#[derive(Debug, Clone)]
pub struct ConfoundCorrector {
    fit: Option<LeastSquares>,
    retained: usize,
}

impl ConfoundCorrector {
    /// Prepare the corrector for a confound matrix.
    ///
    /// `protected` is an optional covariate that is fitted alongside the
    /// confounds but whose effect is kept. With zero confound columns the
    /// corrector is an identity passthrough.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SingularDesign`](crate::Error::SingularDesign) if the
    /// design is not full rank, e.g. a constant confound, duplicated
    /// confounds, or a confound identical to the protected covariate.
    pub fn new(confounds: &ConfoundMatrix, protected: Option<&[f64]>) -> Result<Self> {
        if confounds.is_empty() {
            return Ok(Self {
                fit: None,
                retained: 0,
            });
        }

        let c = confounds.matrix();
        let n = c.nrows();
        let retained = 1 + usize::from(protected.is_some());
        let design = Matrix::from_fn(n, retained + c.ncols(), |i, j| match (j, protected) {
            (0, _) => 1.0,
            (1, Some(p)) => p[i],
            _ => c[(i, j - retained)],
        });

        Ok(Self {
            fit: Some(LeastSquares::new(design)?),
            retained,
        })
    }

    /// Whether correction leaves values untouched.
    pub fn is_passthrough(&self) -> bool {
        self.fit.is_none()
    }

    /// Remove the fitted confound effect from `values`.
    pub fn correct(&self, values: &[f64]) -> Vec<f64> {
        let Some(fit) = &self.fit else {
            return values.to_vec();
        };

        let beta = fit.coefficients(values);
        let design = fit.design();
        values
            .iter()
            .enumerate()
            .map(|(i, &y)| {
                let confound_effect: f64 = (self.retained..design.ncols())
                    .map(|j| design[(i, j)] * beta[j])
                    .sum();
                y - confound_effect
            })
            .collect()
    }
}

/// Metric values and labels after confound removal.
#[derive(Debug, Clone)]
pub struct CorrectedData {
    /// Corrected metric tensor. Tracts outside the selection are copied as-is.
    pub metrics: MetricTensor,
    /// Labels to test against. Targets are confound-corrected; group
    /// labels are unchanged.
    pub labels: Labels,
}

/// Remove confound effects from the selected tracts of a cohort.
///
/// Produces a new tensor; the cohort is left untouched. With no confounds
/// the output equals the input exactly.
pub fn correct_confounds(cohort: &Cohort, tracts: &[usize]) -> Result<CorrectedData> {
    let confounds = cohort.confounds();
    let mut metrics = cohort.metrics().clone();

    let (corrector, labels) = match cohort.labels() {
        Labels::Group(groups) => {
            let covariate: Vec<f64> = groups.iter().map(|&g| f64::from(g)).collect();
            let corrector = ConfoundCorrector::new(confounds, Some(&covariate))?;
            (corrector, Labels::Group(groups.clone()))
        }
        Labels::Target(target) => {
            let corrector = ConfoundCorrector::new(confounds, None)?;
            let corrected = corrector.correct(target);
            (corrector, Labels::Target(corrected))
        }
    };

    if corrector.is_passthrough() {
        return Ok(CorrectedData { metrics, labels });
    }

    debug!(
        confounds = confounds.len(),
        tracts = tracts.len(),
        "removing confound effects"
    );
    for &tract in tracts {
        for position in 0..metrics.n_points() {
            let corrected = corrector.correct(metrics.profile(tract, position));
            metrics.profile_mut(tract, position).copy_from_slice(&corrected);
        }
    }

    Ok(CorrectedData { metrics, labels })
}
