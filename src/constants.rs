//! Default values shared by configuration and analysis.

/// Default significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Default permutation count for group comparisons.
pub const GROUP_PERMUTATIONS: usize = 5_000;

/// Default permutation count for correlation analyses.
///
/// Each correlation permutation costs more than a group permutation, so the
/// default is a fifth of [`GROUP_PERMUTATIONS`].
pub const CORRELATION_PERMUTATIONS: usize = GROUP_PERMUTATIONS / 5;

/// Relative variance below which a position is treated as constant.
pub const DEGENERATE_VARIANCE: f64 = 1e-12;

/// Values with magnitude at or below this are printed in scientific notation.
pub const SCIENTIFIC_CUTOFF: f64 = 1e-5;
