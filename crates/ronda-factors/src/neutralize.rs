//! Cross-sectional neutralization by ordinary least squares.
//!
//! For each date the factor is regressed on the configured exposures plus an
//! intercept, and the residual replaces the factor value.

use ndarray::{Array1, Array2};
use ronda_traits::{PanelIndex, stats::nan_mean};

/// Relative pivot size below which a regressor is treated as collinear.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Replace factor values with their per-date OLS residuals against `features`.
///
/// Per date:
/// - missing feature values are filled with that date's feature mean;
/// - rows with a missing factor value are excluded from the fit and stay NaN;
/// - with fewer than `features.len() + 2` usable rows the date is left as is.
///
/// Every `features` entry must be aligned to the panel rows like `values`.
pub fn neutralize(index: &PanelIndex, values: &[f64], features: &[Vec<f64>]) -> Vec<f64> {
    let mut out = values.to_vec();
    if features.is_empty() {
        return out;
    }
    let k = features.len();

    for (date, range) in index.dates().iter().zip(index.date_ranges()) {
        let y = &values[range.clone()];
        let exposures: Vec<Vec<f64>> = features
            .iter()
            .map(|feature| {
                let column = &feature[range.clone()];
                let mean = nan_mean(column);
                column
                    .iter()
                    .map(|&v| if v.is_finite() { v } else { mean })
                    .collect()
            })
            .collect();

        let usable: Vec<usize> = (0..y.len())
            .filter(|&i| y[i].is_finite() && exposures.iter().all(|x| x[i].is_finite()))
            .collect();
        if usable.len() < k + 2 {
            log::debug!(
                "neutralize: {date} has {} usable rows for {k} exposures, left unchanged",
                usable.len()
            );
            continue;
        }

        let design = Array2::from_shape_fn((usable.len(), k + 1), |(r, c)| {
            if c == 0 { 1.0 } else { exposures[c - 1][usable[r]] }
        });
        let target: Array1<f64> = usable.iter().map(|&i| y[i]).collect();
        let beta = least_squares(&design, &target);
        let residual = &target - &design.dot(&beta);

        for v in &mut out[range.clone()] {
            *v = f64::NAN;
        }
        for (slot, &i) in usable.iter().enumerate() {
            out[range.start + i] = residual[slot];
        }
    }

    out
}

/// Least-squares coefficients from the normal equations `X'X b = X'y`.
///
/// Solved by Gauss-Jordan elimination along the diagonal. A regressor whose pivot
/// shrinks below [`PIVOT_TOLERANCE`] of its own sum of squares is linearly
/// dependent on the earlier ones and gets a zero coefficient; the fitted values
/// are the same as for any other least-squares solution.
pub fn least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Array1<f64> {
    let xt = x.t();
    let mut a = xt.dot(x);
    let mut b = xt.dot(y);
    let k = a.nrows();
    let scale: Vec<f64> = (0..k).map(|i| a[[i, i]]).collect();
    let mut independent = vec![false; k];

    for p in 0..k {
        let pivot = a[[p, p]];
        if !(pivot > PIVOT_TOLERANCE * scale[p]) {
            continue;
        }
        independent[p] = true;
        for r in 0..k {
            if r == p {
                continue;
            }
            let factor = a[[r, p]] / pivot;
            if factor == 0.0 {
                continue;
            }
            for c in 0..k {
                let delta = factor * a[[p, c]];
                a[[r, c]] -= delta;
            }
            let delta = factor * b[p];
            b[r] -= delta;
        }
    }

    Array1::from_shape_fn(k, |i| if independent[i] { b[i] / a[[i, i]] } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn one_date(n: usize) -> PanelIndex {
        let dates = vec!["2024-01-02".to_string(); n];
        let codes: Vec<String> = (0..n).map(|i| format!("S{i:03}")).collect();
        PanelIndex::from_sorted_keys(&dates, &codes).unwrap()
    }

    #[test]
    fn test_least_squares_exact_fit() {
        // y = 1 + 2x
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];
        let beta = least_squares(&x, &y);
        assert_abs_diff_eq!(beta[0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(beta[1], 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_least_squares_collinear_column() {
        // Second regressor duplicates the intercept.
        let x = array![[1.0, 5.0, 0.0], [1.0, 5.0, 1.0], [1.0, 5.0, 2.0], [1.0, 5.0, 4.0]];
        let y = array![2.0, 3.0, 4.0, 6.0];
        let beta = least_squares(&x, &y);
        let fitted = x.dot(&beta);
        for (f, t) in fitted.iter().zip(y.iter()) {
            assert_abs_diff_eq!(f, t, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_neutralize_removes_linear_exposure() {
        let index = one_date(6);
        let size = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let noise = [0.3, -0.1, 0.2, -0.4, 0.1, -0.1];
        let factor: Vec<f64> = size.iter().zip(noise).map(|(s, e)| 0.5 + 2.0 * s + e).collect();

        let resid = neutralize(&index, &factor, &[size.clone()]);

        let mean: f64 = resid.iter().sum::<f64>() / 6.0;
        let cov: f64 = resid.iter().zip(&size).map(|(r, s)| r * (s - 3.5)).sum();
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(cov, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_neutralize_fills_missing_exposure_with_mean() {
        let index = one_date(5);
        let size = vec![1.0, f64::NAN, 3.0, 4.0, 2.0];
        let factor = vec![1.0, 2.0, 3.0, 4.0, 2.5];
        let resid = neutralize(&index, &factor, &[size]);
        assert!(resid.iter().all(|r| r.is_finite()));
    }

    #[test]
    fn test_neutralize_skips_thin_dates() {
        let index = one_date(3);
        let factor = vec![1.0, f64::NAN, 3.0];
        let size = vec![1.0, 2.0, 3.0];
        // Two usable rows < 1 + 2.
        let resid = neutralize(&index, &factor, &[size]);
        assert_eq!(resid[0], 1.0);
        assert!(resid[1].is_nan());
        assert_eq!(resid[2], 3.0);
    }

    #[test]
    fn test_neutralize_without_features_is_identity() {
        let index = one_date(3);
        let factor = vec![1.0, 2.0, 3.0];
        assert_eq!(neutralize(&index, &factor, &[]), factor);
    }
}
