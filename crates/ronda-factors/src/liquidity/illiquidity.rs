//! Illiquidity factor: log absolute return per unit of turnover.

use crate::{
    registry::{FactorParams, config_from_params},
    rolling,
};
use polars::prelude::*;
use ronda_traits::{Factor, FactorSettings, Panel, Result, RondaError};
use serde::{Deserialize, Serialize};

/// Configuration for the illiquidity factor.
///
/// Only the shared settings apply; the lookback defaults to 20 trading days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlliquidityConfig {
    /// Window and post-processing settings.
    #[serde(flatten)]
    pub settings: FactorSettings,
}

impl Default for IlliquidityConfig {
    fn default() -> Self {
        Self {
            settings: FactorSettings::with_lookback(Illiquidity::DEFAULT_LOOKBACK),
        }
    }
}

/// Illiquidity factor.
///
/// Measures how far prices move per unit of trading activity.
///
/// # Computation
///
/// For each asset and date:
/// 1. `r_t = close_t / close_{t-1} - 1`
/// 2. `term_t = ln(1 + |r_t|)`
/// 3. `factor_t = sum(term) / sum(turnover)` over the last `lookback` rows
///
/// Both sums need `lookback / 2` valid points. Volume stands in for turnover when
/// the panel has no turnover column. A zero denominator gives NaN, as does a
/// missing close on the day.
///
/// # Interpretation
///
/// - **Higher values**: larger price moves per unit traded, less liquid
/// - **Lower values**: more liquid
#[derive(Debug, Clone)]
pub struct Illiquidity {
    config: IlliquidityConfig,
}

impl Illiquidity {
    /// Registry name.
    pub const NAME: &'static str = "illiquidity";

    /// Lookback used when none is configured.
    pub const DEFAULT_LOOKBACK: usize = 20;

    /// Create an illiquidity factor with the given configuration.
    #[must_use]
    pub fn new(config: IlliquidityConfig) -> Self {
        let mut config = config;
        if config.settings.lookback.is_none() {
            config.settings.lookback = Some(Self::DEFAULT_LOOKBACK);
        }
        Self { config }
    }

    /// Create the factor from registry parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidConfig`] for an unknown parameter name or a
    /// value that does not deserialize.
    pub fn from_params(params: &FactorParams) -> Result<Self> {
        Ok(Self::new(config_from_params(params, FactorSettings::FIELDS)?))
    }

    /// Rolling window length in trading days.
    #[must_use]
    pub fn lookback(&self) -> usize {
        self.config
            .settings
            .lookback
            .unwrap_or(Self::DEFAULT_LOOKBACK)
    }
}

impl Default for Illiquidity {
    fn default() -> Self {
        Self::new(IlliquidityConfig::default())
    }
}

impl Factor for Illiquidity {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn settings(&self) -> &FactorSettings {
        &self.config.settings
    }

    fn required_columns(&self) -> &[&str] {
        &["close"]
    }

    fn calculate(&self, panel: &Panel) -> Result<DataFrame> {
        let index = panel.index();
        let close = panel.float_column("close")?;
        let activity = match panel.optional_float_column("turnover")? {
            Some(turnover) => turnover,
            None => panel
                .optional_float_column("volume")?
                .ok_or_else(|| RondaError::MissingColumn("turnover or volume".to_string()))?,
        };

        let log_terms: Vec<f64> = rolling::pct_change(index, &close)
            .iter()
            .map(|r| r.abs().ln_1p())
            .collect();

        let window = self.lookback();
        let min_periods = self.config.settings.min_periods();
        let numerator = rolling::rolling_sum(index, &log_terms, window, min_periods);
        let denominator = rolling::rolling_sum(index, &activity, window, min_periods);

        let values: Vec<f64> = numerator
            .iter()
            .zip(&denominator)
            .zip(&close)
            .map(|((&num, &den), &price)| {
                if price.is_nan() || den == 0.0 {
                    f64::NAN
                } else {
                    num / den
                }
            })
            .collect();

        Ok(DataFrame::new(vec![Column::new(Self::NAME.into(), values)])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single_asset(close: &[Option<f64>], activity_col: &str, activity: &[f64]) -> Panel {
        let dates: Vec<String> = (0..close.len())
            .map(|i| format!("2024-01-{:02}", i + 1))
            .collect();
        let df = DataFrame::new(vec![
            Column::new("date".into(), dates),
            Column::new("code".into(), vec!["A"; close.len()]),
            Column::new("close".into(), close.to_vec()),
            Column::new(activity_col.into(), activity.to_vec()),
        ])
        .unwrap();
        Panel::new(df).unwrap()
    }

    fn raw(factor: &Illiquidity, panel: &Panel) -> Vec<f64> {
        let frame = factor.calculate(panel).unwrap();
        crate::pipeline::extract_factor_column(&frame, Illiquidity::NAME, panel.len()).unwrap()
    }

    fn with_lookback(lookback: usize) -> Illiquidity {
        Illiquidity::new(IlliquidityConfig {
            settings: FactorSettings::with_lookback(lookback),
        })
    }

    #[test]
    fn test_default_config() {
        let factor = Illiquidity::default();
        assert_eq!(factor.name(), "illiquidity");
        assert_eq!(factor.lookback(), 20);
        assert_eq!(factor.settings().lag, 1);
    }

    #[test]
    fn test_lookback_filled_when_absent() {
        let factor = Illiquidity::new(IlliquidityConfig {
            settings: FactorSettings::default(),
        });
        assert_eq!(factor.settings().lookback, Some(20));
    }

    #[test]
    fn test_formula() {
        let close = [Some(10.0), Some(11.0), Some(9.9)];
        let panel = single_asset(&close, "turnover", &[1.0, 2.0, 3.0]);
        let values = raw(&with_lookback(2), &panel);

        // First row has no return.
        assert!(values[0].is_nan());
        assert_relative_eq!(values[1], 1.1_f64.ln() / 3.0, epsilon = 1e-12);
        assert_relative_eq!(values[2], 2.0 * 1.1_f64.ln() / 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_price_gives_zero() {
        let close = [Some(10.0); 5];
        let panel = single_asset(&close, "turnover", &[100.0; 5]);
        let values = raw(&with_lookback(4), &panel);

        assert!(values[0].is_nan());
        assert!(values[1].is_nan());
        assert_eq!(&values[2..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_volume_fallback() {
        let close = [Some(10.0), Some(11.0)];
        let panel = single_asset(&close, "volume", &[4.0, 6.0]);
        let values = raw(&with_lookback(2), &panel);
        assert_relative_eq!(values[1], 1.1_f64.ln() / 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_activity_column() {
        let close = [Some(10.0), Some(11.0)];
        let panel = single_asset(&close, "amount", &[4.0, 6.0]);
        let err = with_lookback(2).calculate(&panel).unwrap_err();
        assert!(matches!(err, RondaError::MissingColumn(_)));
    }

    #[test]
    fn test_missing_close_and_zero_turnover() {
        let close = [Some(10.0), Some(11.0), None, Some(12.0)];
        let panel = single_asset(&close, "turnover", &[0.0, 0.0, 5.0, 5.0]);
        let values = raw(&with_lookback(2), &panel);

        // Zero turnover over the window.
        assert!(values[1].is_nan());
        // No close on the day.
        assert!(values[2].is_nan());
        // Returns on both sides of the gap are undefined.
        assert!(values[3].is_nan());
    }
}
