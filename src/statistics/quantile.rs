//! Quantiles of permutation null distributions.
//!
//! Thresholds are read off the null distribution with a conservative rule:
//! the smallest observed value at or above the requested quantile. No
//! interpolation is done, so the false-positive rate of the resulting
//! threshold never exceeds the nominal level because of rounding.

/// Index of the conservative `q`-quantile in a sorted sample of length `n`.
///
/// Returns `ceil(n * q) - 1`, clamped to `[0, n - 1]`.
pub fn upper_quantile_index(n: usize, q: f64) -> usize {
    assert!(n > 0, "Cannot compute quantile of empty slice");
    assert!((0.0..=1.0).contains(&q), "Quantile probability must be in [0, 1]");

    let idx = ((n as f64) * q).ceil() as usize;
    idx.saturating_sub(1).min(n - 1)
}

/// Conservative `q`-quantile of an unsorted sample.
///
/// Uses `select_nth_unstable_by()` for O(n) expected time. The slice is
/// partially reordered as a side effect.
///
/// # Panics
///
/// Panics if `data` is empty or if `q` is outside [0, 1].
pub fn upper_quantile(data: &mut [f64], q: f64) -> f64 {
    let idx = upper_quantile_index(data.len(), q);
    let (_, &mut value, _) = data.select_nth_unstable_by(idx, |a, b| a.total_cmp(b));
    value
}

/// Conservative `q`-quantile of a sample of counts (cluster sizes).
pub fn upper_quantile_counts(data: &mut [usize], q: f64) -> usize {
    let idx = upper_quantile_index(data.len(), q);
    let (_, &mut value, _) = data.select_nth_unstable(idx);
    value
}
