//! Statistical testing pipeline for tract profiles.
//!
//! Each selected tract passes through these stages:
//!
//! 1. **Confound removal** ([`confound`]): regress nuisance covariates out of the metric values
//! 2. **Pointwise statistics** ([`pointwise`]): t statistic or Pearson r and p-value per position
//! 3. **Permutation correction** ([`permutation`]): family-wise threshold from the max-statistic
//!    or max-cluster null distribution
//! 4. **Significance areas** ([`significance`]): mask of positions passing the corrected threshold

mod confound;
mod permutation;
mod pointwise;
mod significance;

pub use confound::{correct_confounds, ConfoundCorrector, CorrectedData};
pub use permutation::{
    permutations_sufficient, run_permutations, PermutationInput, PermutationOutcome,
};
pub use pointwise::{pointwise_statistics, PointwiseStats, StatisticEngine};
pub use significance::{
    alpha_fwe_mask, cluster_fwe_mask, contiguous_runs, longest_run, significance_mask,
    FweThreshold,
};
