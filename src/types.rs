//! Common types shared across the pipeline.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Dynamically sized matrix used for confound designs.
pub type Matrix = DMatrix<f64>;

/// Which kind of hypothesis the analysis tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisType {
    /// Two-sample comparison between group 0 and group 1.
    Group,
    /// Linear association with a continuous target.
    Correlation,
}

impl AnalysisType {
    /// Resolve the analysis type from the metadata column header.
    ///
    /// `group` selects a group comparison, `target` a correlation. Matching
    /// ignores surrounding whitespace and case.
    pub fn from_column_header(header: &str) -> Result<Self> {
        match header.trim().to_ascii_lowercase().as_str() {
            "group" => Ok(AnalysisType::Group),
            "target" => Ok(AnalysisType::Correlation),
            _ => Err(Error::UnrecognizedAnalysisColumn {
                header: header.to_string(),
            }),
        }
    }

    /// Column header for this analysis type.
    pub fn column_header(&self) -> &'static str {
        match self {
            AnalysisType::Group => "group",
            AnalysisType::Correlation => "target",
        }
    }
}

/// Multiple-comparison correction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CorrectionMethod {
    /// Pointwise threshold from the null distribution of the maximum statistic.
    #[default]
    AlphaFwe,
    /// Minimum cluster length from the null distribution of the largest cluster.
    ClusterFwe,
}

/// Per-subject labeling that the permutation procedure shuffles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Labels {
    /// Group membership (0 or 1) per subject.
    Group(Vec<u8>),
    /// Continuous target value per subject.
    Target(Vec<f64>),
}

impl Labels {
    /// Number of labeled subjects.
    pub fn len(&self) -> usize {
        match self {
            Labels::Group(g) => g.len(),
            Labels::Target(t) => t.len(),
        }
    }

    /// Whether no subject is labeled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Analysis type implied by the labeling.
    pub fn analysis_type(&self) -> AnalysisType {
        match self {
            Labels::Group(_) => AnalysisType::Group,
            Labels::Target(_) => AnalysisType::Correlation,
        }
    }

    /// Labels as floating point covariate values.
    pub fn as_covariate(&self) -> Vec<f64> {
        match self {
            Labels::Group(g) => g.iter().map(|&x| f64::from(x)).collect(),
            Labels::Target(t) => t.clone(),
        }
    }

    /// Swap group 0 and group 1. Targets are returned unchanged.
    pub fn swapped(&self) -> Self {
        match self {
            Labels::Group(g) => Labels::Group(g.iter().map(|&x| 1 - x).collect()),
            Labels::Target(t) => Labels::Target(t.clone()),
        }
    }
}
