//! Information Coefficient (IC) calculations.
//!
//! IC is the cross-sectional correlation between factor values and forward
//! returns on a single date. The rank (Spearman) IC is the default; the linear
//! (Pearson) IC is available for comparison.

use crate::{merge::MergedData, metrics::IcSummary};
use derive_more::Display;
use ronda_traits::{Result, RondaError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Correlation used for the IC.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IcMethod {
    /// Rank correlation, ties sharing their average rank.
    #[default]
    #[display("spearman")]
    Spearman,
    /// Linear correlation of the raw values.
    #[display("pearson")]
    Pearson,
}

impl FromStr for IcMethod {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "spearman" => Ok(Self::Spearman),
            "pearson" => Ok(Self::Pearson),
            other => Err(RondaError::InvalidConfig(format!(
                "unknown IC method '{other}', expected spearman or pearson"
            ))),
        }
    }
}

/// Calculate the IC between factor values and forward returns.
///
/// Pairs with a non-finite value on either side are ignored. Returns NaN when
/// fewer than two pairs remain or either side has no variance. Values range from
/// -1 to 1, where:
/// - Positive values indicate the factor predicts returns in the correct direction
/// - Negative values indicate inverse correlation
/// - Values near zero indicate no predictive power
///
/// # Example
///
/// ```
/// use ronda_eval::ic::{IcMethod, calculate_ic};
///
/// let scores = [1.5, 0.3, -0.8, 2.1];
/// let returns = [0.02, 0.01, -0.01, 0.03];
/// let ic = calculate_ic(&scores, &returns, IcMethod::Spearman);
/// assert!((ic - 1.0).abs() < 1e-12);
/// ```
pub fn calculate_ic(factor: &[f64], forward_returns: &[f64], method: IcMethod) -> f64 {
    if factor.len() != forward_returns.len() {
        return f64::NAN;
    }

    let (x, y): (Vec<f64>, Vec<f64>) = factor
        .iter()
        .zip(forward_returns)
        .filter(|(f, r)| f.is_finite() && r.is_finite())
        .map(|(&f, &r)| (f, r))
        .unzip();

    if x.len() < 2 {
        return f64::NAN;
    }

    match method {
        IcMethod::Spearman => pearson_correlation(&compute_ranks(&x), &compute_ranks(&y)),
        IcMethod::Pearson => pearson_correlation(&x, &y),
    }
}

/// Daily IC values, one per date of the merged data.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IcSeries {
    /// Dates in chronological order.
    pub dates: Vec<String>,
    /// IC per date; NaN where the date had too few assets or no variance.
    pub values: Vec<f64>,
}

impl IcSeries {
    /// Number of dates.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no dates.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The non-NaN IC values.
    pub fn valid(&self) -> Vec<f64> {
        self.values.iter().copied().filter(|v| !v.is_nan()).collect()
    }

    /// Summary statistics of the series.
    pub fn summary(&self) -> IcSummary {
        IcSummary::from_values(&self.values)
    }
}

/// Daily IC analysis over merged factor and return data.
#[derive(Debug, Clone, Copy)]
pub struct IcAnalyzer<'a> {
    data: &'a MergedData,
}

impl<'a> IcAnalyzer<'a> {
    /// Create an analyzer over merged data.
    pub const fn new(data: &'a MergedData) -> Self {
        Self { data }
    }

    /// IC of each date, NaN for dates with fewer than `min_assets` pairs.
    pub fn daily_ic(&self, method: IcMethod, min_assets: usize) -> IcSeries {
        let mut series = IcSeries::default();
        for (date, factor, returns) in self.data.by_date() {
            let ic = if factor.len() < min_assets {
                log::debug!("{date}: {} assets below minimum {min_assets}", factor.len());
                f64::NAN
            } else {
                calculate_ic(factor, returns, method)
            };
            series.dates.push(date.to_string());
            series.values.push(ic);
        }
        series
    }

    /// Daily IC and its summary.
    pub fn analyze(&self, method: IcMethod, min_assets: usize) -> (IcSeries, IcSummary) {
        let series = self.daily_ic(method, min_assets);
        let summary = series.summary();
        (series, summary)
    }
}

/// Compute ranks of values, 0-based, with ties sharing their average rank.
pub fn compute_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && indexed[j].1 == indexed[i].1 {
            j += 1;
        }

        let avg_rank = (i + j - 1) as f64 / 2.0;
        for &(original, _) in &indexed[i..j] {
            ranks[original] = avg_rank;
        }

        i = j;
    }

    ranks
}

/// Linear correlation coefficient, NaN when either side has no variance.
fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    if n < 2.0 {
        return f64::NAN;
    }

    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }

    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}
