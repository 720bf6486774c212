//! Statistical building blocks.
//!
//! - Test statistics on centered position profiles (t, Pearson r)
//! - Student's t reference distribution for p-values and critical values
//! - Least-squares fitting with a rank check
//! - Counter-seeded label permutations
//! - Conservative quantiles of null distributions

mod distribution;
mod permutation;
mod profile;
mod quantile;
mod regression;

pub use distribution::ReferenceDistribution;
pub use permutation::{counter_rng_seed, iteration_rng, permute_into, PermutedLabels};
pub use profile::{pearson_r, two_sample_t, CenteredProfile};
pub use quantile::{upper_quantile, upper_quantile_counts, upper_quantile_index};
pub use regression::LeastSquares;
