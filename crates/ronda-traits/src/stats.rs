//! Statistical utility functions for cross-sectional processing.
//!
//! All functions skip NaN inputs when estimating statistics and propagate NaN
//! positions unchanged to their outputs.

/// Z-score standardization result containing computed statistics.
#[derive(Debug, Clone, Copy)]
pub struct StandardizeResult {
    /// The computed mean of the finite input values.
    pub mean: f64,
    /// The computed sample standard deviation (N-1 denominator).
    pub std: f64,
    /// Whether the standardization was applied (false if the variance was zero or undefined).
    pub applied: bool,
}

/// Mean of the finite values, NaN if there are none.
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, n) = values
        .iter()
        .filter(|x| x.is_finite())
        .fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

/// Sample standard deviation (N-1) of the finite values.
///
/// NaN with fewer than two finite values. Exactly zero when all finite values are
/// equal, so that a constant cross-section is recognized as degenerate regardless
/// of rounding in the mean.
pub fn nan_std(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    let n = finite.len();
    if n < 2 {
        return f64::NAN;
    }
    if finite.iter().all(|&x| x == finite[0]) {
        return 0.0;
    }
    let mean = finite.iter().sum::<f64>() / n as f64;
    let variance = finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

/// Finite values sorted ascending.
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Quantile of sorted data with linear interpolation between order statistics.
///
/// Returns NaN for empty input.
pub fn quantile_linear(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Standardize values to z-scores (mean=0, std=1).
///
/// Uses the sample standard deviation. If the standard deviation is zero or
/// undefined, every output is NaN: a degenerate cross-section carries no
/// ranking information.
///
/// # Examples
///
/// ```
/// use ronda_traits::stats::standardize;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let (standardized, result) = standardize(&values);
///
/// assert!(result.applied);
/// assert!((result.mean - 3.0).abs() < 1e-10);
/// assert!(standardized[2].abs() < 1e-10);
/// ```
pub fn standardize(values: &[f64]) -> (Vec<f64>, StandardizeResult) {
    let mut out = values.to_vec();
    let result = standardize_inplace(&mut out);
    (out, result)
}

/// Standardize values to z-scores in-place.
///
/// See [`standardize`] for the semantics.
pub fn standardize_inplace(values: &mut [f64]) -> StandardizeResult {
    let mean = nan_mean(values);
    let std = nan_std(values);
    let applied = std.is_finite() && std > 0.0;

    for v in values.iter_mut() {
        *v = if applied { (*v - mean) / std } else { f64::NAN };
    }

    StandardizeResult { mean, std, applied }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_standardize_basic() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let (standardized, result) = standardize(&values);

        assert!(result.applied);
        assert_abs_diff_eq!(result.mean, 3.0, epsilon = 1e-12);

        let mean = nan_mean(&standardized);
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(nan_std(&standardized), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_standardize_constant_values_are_nan() {
        let values = vec![0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1];
        let (standardized, result) = standardize(&values);

        assert!(!result.applied);
        assert_eq!(result.std, 0.0);
        assert!(standardized.iter().all(|x| x.is_nan()));
    }

    #[test]
    fn test_standardize_single_value_is_nan() {
        let (standardized, result) = standardize(&[42.0, f64::NAN]);
        assert!(!result.applied);
        assert!(standardized.iter().all(|x| x.is_nan()));
    }

    #[test]
    fn test_standardize_with_nan() {
        let values = vec![1.0, 2.0, f64::NAN, 4.0, 5.0];
        let (standardized, result) = standardize(&values);

        assert!(result.applied);
        assert_abs_diff_eq!(result.mean, 3.0, epsilon = 1e-12);
        assert!(standardized[2].is_nan());
    }

    #[test]
    fn test_standardize_tiny_scale() {
        // Illiquidity values live around 1e-10; scale must not matter.
        let values = vec![1e-10, 2e-10, 3e-10];
        let (standardized, result) = standardize(&values);
        assert!(result.applied);
        assert_abs_diff_eq!(standardized[0], -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(standardized[2], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_quantile_linear() {
        let sorted = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_abs_diff_eq!(quantile_linear(&sorted, 0.0), 1.0);
        assert_abs_diff_eq!(quantile_linear(&sorted, 0.5), 3.0);
        assert_abs_diff_eq!(quantile_linear(&sorted, 0.1), 1.4, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile_linear(&sorted, 1.0), 5.0);
        assert!(quantile_linear(&[], 0.5).is_nan());
    }

    #[test]
    fn test_nan_mean_and_std() {
        assert!(nan_mean(&[f64::NAN]).is_nan());
        assert_abs_diff_eq!(nan_mean(&[1.0, f64::NAN, 3.0]), 2.0);
        assert!(nan_std(&[1.0]).is_nan());
        assert_abs_diff_eq!(nan_std(&[1.0, 3.0]), 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_sorted_finite() {
        let sorted = sorted_finite(&[3.0, f64::NAN, 1.0, f64::INFINITY, 2.0]);
        assert_eq!(sorted, vec![1.0, 2.0, 3.0]);
    }
}
