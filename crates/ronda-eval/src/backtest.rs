//! Quantile layer backtest.
//!
//! Each date's assets are split into equal-frequency buckets by factor value, and
//! the equal-weighted forward return of every bucket is recorded together with a
//! long-short spread (top bucket minus bottom bucket).

use crate::merge::MergedData;
use polars::prelude::*;
use ronda_traits::{
    DATE_COL, Result, RondaError, float_column_from,
    stats::{nan_mean, quantile_linear, sorted_finite},
};
use serde::{Deserialize, Serialize};

/// Name of the long-short column.
pub const LONG_SHORT_COL: &str = "Long-Short";

/// Layer backtest configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Number of quantile buckets
    pub groups: usize,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self { groups: 5 }
    }
}

/// Per-date bucket returns from a layer backtest.
///
/// Buckets are numbered from 1 (lowest factor values) to `groups` (highest).
/// A date whose factor values cannot be split into `groups` distinct quantile
/// bins is kept with NaN in every column.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayerReturns {
    /// Number of buckets
    pub groups: usize,
    /// Dates in chronological order
    pub dates: Vec<String>,
    /// One return series per bucket, lowest bucket first
    pub buckets: Vec<Vec<f64>>,
    /// Top bucket minus bottom bucket, per date
    pub long_short: Vec<f64>,
}

impl LayerReturns {
    /// Column names: `G1`..`G{groups}` then `Long-Short`.
    pub fn column_names(&self) -> Vec<String> {
        (1..=self.groups)
            .map(|g| format!("G{g}"))
            .chain(std::iter::once(LONG_SHORT_COL.to_string()))
            .collect()
    }

    /// Every return series in column order, the long-short spread last.
    pub fn columns(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.buckets
            .iter()
            .map(Vec::as_slice)
            .chain(std::iter::once(self.long_short.as_slice()))
    }

    /// Running simple sum of the daily returns.
    ///
    /// This is an additive approximation meant for charting, not compounding.
    /// A NaN day contributes nothing and stays NaN.
    pub fn cumulative(&self) -> Self {
        Self {
            groups: self.groups,
            dates: self.dates.clone(),
            buckets: self.buckets.iter().map(|b| cumulative_sum(b)).collect(),
            long_short: cumulative_sum(&self.long_short),
        }
    }

    /// Mean daily return of each column, skipping NaN days.
    pub fn mean_returns(&self) -> Vec<(String, f64)> {
        self.column_names()
            .into_iter()
            .zip(self.columns().map(nan_mean))
            .collect()
    }

    /// Mean daily return of each column scaled by `trading_days` per year.
    pub fn annualized(&self, trading_days: usize) -> Vec<(String, f64)> {
        self.mean_returns()
            .into_iter()
            .map(|(name, mean)| (name, mean * trading_days as f64))
            .collect()
    }

    /// The table as a frame: `date`, `G1`..`G{groups}`, `Long-Short`.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![Column::new(DATE_COL.into(), self.dates.clone())];
        for (name, values) in self.column_names().iter().zip(self.columns()) {
            columns.push(float_column_from(name, values));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Quantile layer backtest.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerBacktest {
    config: LayerConfig,
}

impl LayerBacktest {
    /// Create a backtest with the given configuration.
    pub const fn new(config: LayerConfig) -> Self {
        Self { config }
    }

    /// Bucket every date of the merged data and average forward returns per bucket.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidConfig`] if `groups` is zero.
    pub fn run(&self, data: &MergedData) -> Result<LayerReturns> {
        let groups = self.config.groups;
        if groups == 0 {
            return Err(RondaError::InvalidConfig(
                "layer backtest needs at least one group".to_string(),
            ));
        }

        let mut out = LayerReturns {
            groups,
            buckets: vec![Vec::with_capacity(data.n_dates()); groups],
            ..Default::default()
        };
        let mut excluded = 0;

        for (date, factor, returns) in data.by_date() {
            let means = match assign_buckets(factor, groups) {
                Some(labels) => bucket_means(&labels, returns, groups),
                None => {
                    log::debug!("{date}: fewer than {groups} distinct quantile bins, excluded");
                    excluded += 1;
                    vec![f64::NAN; groups]
                }
            };
            out.long_short.push(means[groups - 1] - means[0]);
            for (bucket, mean) in out.buckets.iter_mut().zip(means) {
                bucket.push(mean);
            }
            out.dates.push(date.to_string());
        }

        log::info!(
            "layer backtest: {} dates, {groups} groups, {excluded} dates excluded",
            out.dates.len()
        );
        Ok(out)
    }
}

/// Equal-frequency bucket (0-based) of each value.
///
/// Bin edges are the `k / groups` quantiles of the values. The first bin is closed
/// on both ends, the others only on the right. `None` when there are fewer than
/// `groups` distinct values or repeated edges leave fewer than `groups` bins.
pub fn assign_buckets(values: &[f64], groups: usize) -> Option<Vec<usize>> {
    let sorted = sorted_finite(values);
    let mut distinct = sorted.clone();
    distinct.dedup();
    if distinct.len() < groups.max(1) {
        return None;
    }

    let mut edges: Vec<f64> = (0..=groups)
        .map(|k| quantile_linear(&sorted, k as f64 / groups as f64))
        .collect();
    edges.dedup();
    if edges.len() < groups + 1 {
        return None;
    }

    let inner = &edges[1..];
    values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                Some(inner.partition_point(|&edge| edge < v).min(groups - 1))
            } else {
                None
            }
        })
        .collect()
}

fn bucket_means(labels: &[usize], returns: &[f64], groups: usize) -> Vec<f64> {
    let mut sums = vec![0.0; groups];
    let mut counts = vec![0usize; groups];
    for (&label, &ret) in labels.iter().zip(returns) {
        sums[label] += ret;
        counts[label] += 1;
    }
    sums.iter()
        .zip(&counts)
        .map(|(&sum, &count)| if count == 0 { f64::NAN } else { sum / count as f64 })
        .collect()
}

fn cumulative_sum(values: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                f64::NAN
            } else {
                total += v;
                total
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn merged(days: &[(&str, &[f64], &[f64])]) -> MergedData {
        let mut rows = Vec::new();
        for (date, factor, returns) in days {
            for (i, (&f, &r)) in factor.iter().zip(returns.iter()).enumerate() {
                rows.push((date.to_string(), format!("S{i:02}"), f, r));
            }
        }
        MergedData::from_rows(rows)
    }

    #[test]
    fn test_assign_buckets_equal_frequency() {
        let values: Vec<f64> = (0..10).map(f64::from).collect();
        let labels = assign_buckets(&values, 5).unwrap();
        assert_eq!(labels, vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn test_assign_buckets_order_independent() {
        let values = [9.0, 0.0, 4.0, 5.0, 1.0];
        let labels = assign_buckets(&values, 5).unwrap();
        assert_eq!(labels, vec![4, 0, 2, 3, 1]);
    }

    #[test]
    fn test_assign_buckets_too_few_distinct() {
        let values = [1.0, 1.0, 1.0, 2.0, 2.0, 3.0];
        assert!(assign_buckets(&values, 5).is_none());
        assert!(assign_buckets(&[], 5).is_none());
    }

    #[test]
    fn test_run_bucket_and_long_short() {
        let factor: Vec<f64> = (0..10).map(f64::from).collect();
        let returns: Vec<f64> = (0..10).map(|i| f64::from(i) * 0.01).collect();
        let data = merged(&[("2024-01-02", &factor[..], &returns[..])]);

        let layers = LayerBacktest::new(LayerConfig { groups: 5 }).run(&data).unwrap();
        assert_eq!(layers.dates, vec!["2024-01-02"]);
        assert_abs_diff_eq!(layers.buckets[0][0], 0.005, epsilon = 1e-12);
        assert_abs_diff_eq!(layers.buckets[4][0], 0.085, epsilon = 1e-12);
        assert_abs_diff_eq!(layers.long_short[0], 0.08, epsilon = 1e-12);
    }

    #[test]
    fn test_run_excludes_degenerate_date() {
        let good: Vec<f64> = (0..10).map(f64::from).collect();
        // Four distinct values cannot fill five buckets.
        let flat = [1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0];
        let data = merged(&[
            ("2024-01-02", &good[..], &good[..]),
            ("2024-01-03", &flat[..], &flat[..]),
        ]);

        let layers = LayerBacktest::default().run(&data).unwrap();
        assert_eq!(layers.dates.len(), 2);
        assert!(layers.buckets.iter().all(|b| b[0].is_finite()));
        assert!(layers.buckets.iter().all(|b| b[1].is_nan()));
        assert!(layers.long_short[1].is_nan());
    }

    #[test]
    fn test_top_bucket_dominates_bottom() {
        let factor = [0.3, -1.2, 0.8, 2.2, -0.1, 0.0, 1.7, -0.9, 0.5, 1.1];
        let labels = assign_buckets(&factor, 5).unwrap();
        let top_min = factor
            .iter()
            .zip(&labels)
            .filter(|(_, l)| **l == 4)
            .map(|(f, _)| *f)
            .fold(f64::INFINITY, f64::min);
        let bottom_max = factor
            .iter()
            .zip(&labels)
            .filter(|(_, l)| **l == 0)
            .map(|(f, _)| *f)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(top_min >= bottom_max);
    }

    #[test]
    fn test_cumulative_and_annualized() {
        let layers = LayerReturns {
            groups: 1,
            dates: vec!["d1".into(), "d2".into(), "d3".into()],
            buckets: vec![vec![0.01, f64::NAN, 0.02]],
            long_short: vec![0.0, f64::NAN, 0.0],
        };

        let cumulative = layers.cumulative();
        assert_abs_diff_eq!(cumulative.buckets[0][0], 0.01, epsilon = 1e-12);
        assert!(cumulative.buckets[0][1].is_nan());
        assert_abs_diff_eq!(cumulative.buckets[0][2], 0.03, epsilon = 1e-12);

        let annual = layers.annualized(252);
        assert_eq!(annual[0].0, "G1");
        assert_abs_diff_eq!(annual[0].1, 0.015 * 252.0, epsilon = 1e-9);
        assert_eq!(annual[1].0, "Long-Short");
    }

    #[test]
    fn test_to_dataframe_columns() {
        let factor: Vec<f64> = (0..6).map(f64::from).collect();
        let data = merged(&[("2024-01-02", &factor[..], &factor[..])]);
        let layers = LayerBacktest::new(LayerConfig { groups: 3 }).run(&data).unwrap();
        let df = layers.to_dataframe().unwrap();

        let names: Vec<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["date", "G1", "G2", "G3", "Long-Short"]);
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn test_zero_groups_rejected() {
        let data = merged(&[]);
        let err = LayerBacktest::new(LayerConfig { groups: 0 }).run(&data).unwrap_err();
        assert!(matches!(err, RondaError::InvalidConfig(_)));
    }
}
