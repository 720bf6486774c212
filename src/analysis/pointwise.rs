//! Pointwise test statistics along tract profiles.
//!
//! A [`StatisticEngine`] holds the centered values of every position of the
//! tracts under test, concatenated in tract order. It evaluates the real
//! labeling once for the observed statistics and any number of permuted
//! labelings for the null distribution, using the same code path for both.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::cohort::MetricTensor;
use crate::error::Result;
use crate::statistics::{CenteredProfile, PermutedLabels, ReferenceDistribution};
use crate::types::{AnalysisType, Labels};

/// Statistic and two-sided p-value per position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointwiseStats {
    /// t statistic (group) or Pearson r (correlation). 0 where undefined.
    pub statistic: Vec<f64>,
    /// Two-sided p-values. 1 where the statistic is undefined.
    pub p_value: Vec<f64>,
    /// Positions where the statistic is undefined (zero variance).
    pub degenerate: Vec<usize>,
}

impl PointwiseStats {
    /// Restrict to a range of concatenated positions, re-indexing from 0.
    pub fn slice(&self, range: Range<usize>) -> Self {
        Self {
            statistic: self.statistic[range.clone()].to_vec(),
            p_value: self.p_value[range.clone()].to_vec(),
            degenerate: self
                .degenerate
                .iter()
                .filter(|&&i| range.contains(&i))
                .map(|&i| i - range.start)
                .collect(),
        }
    }
}

/// Labeling in the form the statistics consume.
#[derive(Debug, Clone)]
enum Contrast {
    Group(Vec<u8>),
    /// Centered target; permuting it equals centering a permuted target.
    Target {
        centered: Vec<f64>,
        sum_squares: f64,
    },
}

/// Evaluates statistic profiles for the real and permuted labelings.
#[derive(Debug, Clone)]
pub struct StatisticEngine {
    profiles: Vec<CenteredProfile>,
    segments: Vec<Range<usize>>,
    contrast: Contrast,
    reference: ReferenceDistribution,
}

impl StatisticEngine {
    /// Prepare the positions of `tracts` (concatenated in the given order).
    pub fn new(metrics: &MetricTensor, tracts: &[usize], labels: &Labels) -> Result<Self> {
        let n_points = metrics.n_points();
        let mut profiles = Vec::with_capacity(tracts.len() * n_points);
        let mut segments = Vec::with_capacity(tracts.len());
        for &tract in tracts {
            let start = profiles.len();
            profiles.extend((0..n_points).map(|p| CenteredProfile::new(metrics.profile(tract, p))));
            segments.push(start..profiles.len());
        }

        let contrast = match labels {
            Labels::Group(groups) => Contrast::Group(groups.clone()),
            Labels::Target(target) => {
                let target = CenteredProfile::new(target);
                // A constant target makes every correlation undefined.
                let sum_squares = if target.is_constant() {
                    0.0
                } else {
                    target.sum_squares()
                };
                Contrast::Target {
                    centered: target.centered().to_vec(),
                    sum_squares,
                }
            }
        };

        let reference = ReferenceDistribution::new(labels.analysis_type(), metrics.n_subjects())?;

        Ok(Self {
            profiles,
            segments,
            contrast,
            reference,
        })
    }

    /// Total number of concatenated positions.
    pub fn n_positions(&self) -> usize {
        self.profiles.len()
    }

    /// Position range of each tract within the concatenation.
    pub fn segments(&self) -> &[Range<usize>] {
        &self.segments
    }

    /// Analysis type being tested.
    pub fn analysis_type(&self) -> AnalysisType {
        match self.contrast {
            Contrast::Group(_) => AnalysisType::Group,
            Contrast::Target { .. } => AnalysisType::Correlation,
        }
    }

    /// Reference distribution used for p-values.
    pub fn reference(&self) -> &ReferenceDistribution {
        &self.reference
    }

    /// The labeling that permutations shuffle.
    pub fn permutable_labels(&self) -> Labels {
        match &self.contrast {
            Contrast::Group(groups) => Labels::Group(groups.clone()),
            Contrast::Target { centered, .. } => Labels::Target(centered.clone()),
        }
    }

    fn statistic(&self, position: usize, labels: &PermutedLabels) -> Option<f64> {
        let profile = &self.profiles[position];
        match (labels, &self.contrast) {
            (PermutedLabels::Group(groups), _) => profile.group_t(groups),
            (PermutedLabels::Target(target), Contrast::Target { sum_squares, .. }) => {
                profile.correlation(target, *sum_squares)
            }
            (PermutedLabels::Target(_), Contrast::Group(_)) => None,
        }
    }

    /// Statistics of every position under a (permuted) labeling.
    ///
    /// Undefined statistics are written as 0 so they never contribute to a
    /// maximum or a cluster.
    pub fn statistics_into(&self, labels: &PermutedLabels, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.profiles.len());
        for (position, slot) in out.iter_mut().enumerate() {
            *slot = self.statistic(position, labels).unwrap_or(0.0);
        }
    }

    /// Statistics and p-values for the real labeling.
    pub fn observed(&self) -> PointwiseStats {
        let labels = PermutedLabels::like(&self.permutable_labels());
        let mut statistic = Vec::with_capacity(self.profiles.len());
        let mut p_value = Vec::with_capacity(self.profiles.len());
        let mut degenerate = Vec::new();

        for position in 0..self.profiles.len() {
            match self.statistic(position, &labels) {
                Some(stat) => {
                    statistic.push(stat);
                    p_value.push(self.reference.p_value(stat));
                }
                None => {
                    statistic.push(0.0);
                    p_value.push(1.0);
                    degenerate.push(position);
                }
            }
        }

        PointwiseStats {
            statistic,
            p_value,
            degenerate,
        }
    }
}

/// Statistic and p-value at every position of one tract.
pub fn pointwise_statistics(
    metrics: &MetricTensor,
    tract: usize,
    labels: &Labels,
) -> Result<PointwiseStats> {
    Ok(StatisticEngine::new(metrics, &[tract], labels)?.observed())
}
