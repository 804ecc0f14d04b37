//! Summary statistics of a daily IC series.

use ronda_traits::stats::nan_std;
use serde::{Deserialize, Serialize};

/// Summary of a daily IC series.
///
/// NaN days (too few assets, no variance) are excluded from every statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IcSummary {
    /// Mean IC
    pub mean: f64,
    /// Sample standard deviation of IC, NaN with fewer than two valid days
    pub std: f64,
    /// Information ratio: mean / std, 0 when std is zero or undefined
    pub ir: f64,
    /// Fraction of valid days with a positive IC
    pub win_rate: f64,
    /// Number of valid days
    pub valid_days: usize,
}

impl IcSummary {
    /// Summarize IC values, skipping NaN.
    ///
    /// # Example
    ///
    /// ```
    /// use ronda_eval::IcSummary;
    ///
    /// let summary = IcSummary::from_values(&[0.05, f64::NAN, -0.01, 0.08]);
    /// assert_eq!(summary.valid_days, 3);
    /// assert!((summary.win_rate - 2.0 / 3.0).abs() < 1e-12);
    /// ```
    pub fn from_values(values: &[f64]) -> Self {
        let valid: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();
        let valid_days = valid.len();

        if valid_days == 0 {
            return Self {
                mean: f64::NAN,
                std: f64::NAN,
                ir: 0.0,
                win_rate: f64::NAN,
                valid_days,
            };
        }

        let mean = valid.iter().sum::<f64>() / valid_days as f64;
        let std = nan_std(&valid);
        let ir = if std.is_finite() && std > 0.0 { mean / std } else { 0.0 };
        let wins = valid.iter().filter(|&&ic| ic > 0.0).count();

        Self {
            mean,
            std,
            ir,
            win_rate: wins as f64 / valid_days as f64,
            valid_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_summary_statistics() {
        let summary = IcSummary::from_values(&[0.05, 0.03, 0.07, 0.02, 0.06]);

        assert_eq!(summary.valid_days, 5);
        assert_relative_eq!(summary.mean, 0.046, epsilon = 1e-12);
        // Sample variance: (0.004^2 + 0.016^2 + 0.024^2 + 0.026^2 + 0.014^2) / 4
        assert_relative_eq!(summary.std, 0.00043_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(summary.ir, summary.mean / summary.std, epsilon = 1e-12);
        assert_relative_eq!(summary.win_rate, 1.0);
    }

    #[test]
    fn test_summary_skips_nan() {
        let summary = IcSummary::from_values(&[0.1, f64::NAN, -0.1, f64::NAN]);
        assert_eq!(summary.valid_days, 2);
        assert_relative_eq!(summary.mean, 0.0, epsilon = 1e-12);
        assert_relative_eq!(summary.win_rate, 0.5);
    }

    #[test]
    fn test_summary_zero_std_gives_zero_ir() {
        let summary = IcSummary::from_values(&[0.02, 0.02, 0.02]);
        assert_eq!(summary.std, 0.0);
        assert_eq!(summary.ir, 0.0);

        let single = IcSummary::from_values(&[0.02]);
        assert!(single.std.is_nan());
        assert_eq!(single.ir, 0.0);
    }

    #[test]
    fn test_summary_empty() {
        let summary = IcSummary::from_values(&[f64::NAN]);
        assert_eq!(summary.valid_days, 0);
        assert!(summary.mean.is_nan());
        assert_eq!(summary.ir, 0.0);
    }
}
