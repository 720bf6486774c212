//! Reference distributions for two-sided p-values.
//!
//! Both analysis types use Student's t with `n − 2` degrees of freedom: the
//! pooled two-sample test directly, the correlation test after converting
//! r to `t = r·√(df / (1 − r²))`.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::{Error, Result};
use crate::types::AnalysisType;

/// Converts statistics to p-values and back to critical statistics.
#[derive(Debug, Clone)]
pub struct ReferenceDistribution {
    analysis: AnalysisType,
    df: f64,
    t: StudentsT,
}

impl ReferenceDistribution {
    /// Reference distribution for `n_subjects` subjects.
    pub fn new(analysis: AnalysisType, n_subjects: usize) -> Result<Self> {
        let df = n_subjects as f64 - 2.0;
        let t = StudentsT::new(0.0, 1.0, df).map_err(|_| Error::TooFewSubjects {
            reason: format!("{} subjects leave no degrees of freedom", n_subjects),
        })?;
        Ok(Self { analysis, df, t })
    }

    /// Degrees of freedom.
    pub fn df(&self) -> f64 {
        self.df
    }

    /// Two-sided p-value of a statistic (t for groups, r for correlations).
    pub fn p_value(&self, statistic: f64) -> f64 {
        let t = match self.analysis {
            AnalysisType::Group => statistic,
            AnalysisType::Correlation => {
                if statistic.abs() >= 1.0 {
                    return 0.0;
                }
                statistic * (self.df / (1.0 - statistic * statistic)).sqrt()
            }
        };
        if t.is_nan() {
            return 1.0;
        }
        if t.is_infinite() {
            return 0.0;
        }
        (2.0 * self.t.cdf(-t.abs())).clamp(0.0, 1.0)
    }

    /// Smallest |statistic| whose two-sided p-value is below `alpha`.
    pub fn critical_statistic(&self, alpha: f64) -> f64 {
        let t = self.t.inverse_cdf(1.0 - alpha / 2.0);
        match self.analysis {
            AnalysisType::Group => t,
            AnalysisType::Correlation => t / (self.df + t * t).sqrt(),
        }
    }
}
