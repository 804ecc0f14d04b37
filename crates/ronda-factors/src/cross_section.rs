//! Cross-sectional (per-date) transforms.
//!
//! Winsorization and z-scoring are computed independently for each date's
//! cross-section of assets. NaN entries never contribute to a date's statistics
//! and stay NaN.

use ronda_traits::{
    PanelIndex,
    stats::{sorted_finite, standardize_inplace},
};

/// Apply `transform` to each date's slice of `values`.
///
/// The transform receives the date's values in asset order and must return a
/// vector of the same length.
pub fn transform_by_date<F>(index: &PanelIndex, values: &[f64], mut transform: F) -> Vec<f64>
where
    F: FnMut(&[f64]) -> Vec<f64>,
{
    let mut out = Vec::with_capacity(values.len());
    for range in index.date_ranges() {
        let transformed = transform(&values[range.clone()]);
        debug_assert_eq!(transformed.len(), range.len());
        out.extend(transformed);
    }
    out
}

/// Clip a cross-section to its `limit` and `1 - limit` quantiles.
///
/// The bounds are order statistics of the finite values: the lower bound sits at
/// sorted position `floor(limit * (n - 1))` and the upper bound at
/// `ceil((1 - limit) * (n - 1))`. Since the bounds are themselves sample values,
/// winsorizing an already winsorized cross-section leaves it unchanged.
pub fn winsorize(values: &[f64], limit: f64) -> Vec<f64> {
    let sorted = sorted_finite(values);
    if sorted.is_empty() {
        return values.to_vec();
    }

    let last = (sorted.len() - 1) as f64;
    let lower = sorted[(limit * last).floor() as usize];
    let upper = sorted[((1.0 - limit) * last).ceil() as usize];

    values
        .iter()
        .map(|&v| if v.is_nan() { v } else { v.clamp(lower, upper) })
        .collect()
}

/// Z-score a cross-section with its mean and sample standard deviation.
///
/// A cross-section whose standard deviation is zero or undefined becomes all NaN.
pub fn zscore(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    standardize_inplace(&mut out);
    out
}
