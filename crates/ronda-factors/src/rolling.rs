//! Per-asset time-series operations over a panel.
//!
//! Each function walks every asset's rows in chronological order (as recorded in
//! [`PanelIndex::asset_rows`]) and writes its result back at the same row
//! positions, so the output is always aligned to the panel's canonical order.
//! Windows count rows, not calendar days; a complete panel therefore makes every
//! trading day count even when an asset has no data.

use ronda_traits::{PanelIndex, stats::nan_std};

/// Simple return `x(t) / x(t-1) - 1` along each asset's history.
///
/// The first row of each asset and any row touching a missing value is NaN, as is
/// a non-finite ratio (zero previous value).
pub fn pct_change(index: &PanelIndex, values: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for rows in index.asset_rows() {
        for pair in rows.windows(2) {
            let change = values[pair[1]] / values[pair[0]] - 1.0;
            if change.is_finite() {
                out[pair[1]] = change;
            }
        }
    }
    out
}

/// Shift each asset's series forward by `periods` rows.
///
/// The value at an asset's i-th row becomes the value from its (i - periods)-th
/// row; the first `periods` rows become NaN.
pub fn shift(index: &PanelIndex, values: &[f64], periods: usize) -> Vec<f64> {
    if periods == 0 {
        return values.to_vec();
    }
    let mut out = vec![f64::NAN; values.len()];
    for rows in index.asset_rows() {
        for (i, &row) in rows.iter().enumerate().skip(periods) {
            out[row] = values[rows[i - periods]];
        }
    }
    out
}

/// Rolling sum over `window` rows, skipping NaN.
///
/// NaN where the window holds fewer than `min_periods` finite values.
pub fn rolling_sum(index: &PanelIndex, values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling_apply(index, values, window, min_periods, |xs| xs.iter().sum())
}

/// Rolling sample standard deviation (N-1) over `window` rows, skipping NaN.
///
/// NaN where the window holds fewer than `min_periods` finite values, or fewer
/// than two.
pub fn rolling_std(index: &PanelIndex, values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling_apply(index, values, window, min_periods, nan_std)
}

fn rolling_apply<F>(
    index: &PanelIndex,
    values: &[f64],
    window: usize,
    min_periods: usize,
    reduce: F,
) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let window = window.max(1);
    let mut out = vec![f64::NAN; values.len()];
    let mut buf = Vec::with_capacity(window);

    for rows in index.asset_rows() {
        for (i, &row) in rows.iter().enumerate() {
            let start = (i + 1).saturating_sub(window);
            buf.clear();
            buf.extend(
                rows[start..=i]
                    .iter()
                    .map(|&r| values[r])
                    .filter(|v| v.is_finite()),
            );
            if buf.len() >= min_periods.max(1) {
                out[row] = reduce(&buf);
            }
        }
    }
    out
}
