//! Quantile computation using O(n) selection.
//!
//! Uses `slice.select_nth_unstable_by()` (introselect) so callers with a
//! handful of calibration ratios don't pay for a full sort.

/// Compute a single quantile from a mutable slice.
///
/// Uses the "R-7" definition (linear interpolation between order
/// statistics). The slice is partially reordered as a side effect.
///
/// Returns `None` if `data` is empty or `p` is outside `[0, 1]`.
pub fn compute_quantile(data: &mut [f64], p: f64) -> Option<f64> {
    if data.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }

    let n = data.len();
    if n == 1 {
        return Some(data[0]);
    }

    let h = (n - 1) as f64 * p;
    let h_floor = h.floor() as usize;
    let h_frac = h - h.floor();

    if h_floor >= n - 1 {
        let (_, &mut max, _) = data.select_nth_unstable_by(n - 1, |a, b| a.total_cmp(b));
        return Some(max);
    }

    let (_, &mut lower, upper) = data.select_nth_unstable_by(h_floor, |a, b| a.total_cmp(b));
    if h_frac == 0.0 {
        return Some(lower);
    }

    // Smallest element of the upper partition is the next order statistic
    let upper_min = upper.iter().copied().fold(f64::INFINITY, f64::min);
    Some(lower + h_frac * (upper_min - lower))
}

/// Median of `data` (partially reordered).
pub fn median(data: &mut [f64]) -> Option<f64> {
    compute_quantile(data, 0.5)
}
