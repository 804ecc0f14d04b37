//! Factor trait for computing cross-sectional signals over a panel.
//!
//! A factor is a named, parameterized computation that maps a [`Panel`] to one
//! value per (date, asset) row. Implementations only provide the raw formula in
//! [`Factor::calculate`]; winsorization, standardization, neutralization and the
//! look-ahead lag are applied uniformly by the pipeline in `ronda-factors`, driven
//! by the factor's [`FactorSettings`].

use crate::{Panel, Result, RondaError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Post-processing and windowing parameters shared by every factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorSettings {
    /// Rolling window length in trading days.
    pub lookback: Option<usize>,
    /// Number of trading days the final output is shifted forward per asset.
    pub lag: usize,
    /// Fraction clipped at each tail by winsorization.
    pub winsor_limit: f64,
    /// Whether to winsorize each cross-section.
    pub do_winsor: bool,
    /// Whether to z-score each cross-section.
    pub do_zscore: bool,
    /// Panel columns regressed out of the factor, date by date.
    pub neutralize_cols: Vec<String>,
}

impl Default for FactorSettings {
    fn default() -> Self {
        Self {
            lookback: None,
            lag: 1,
            winsor_limit: 0.01,
            do_winsor: false,
            do_zscore: false,
            neutralize_cols: Vec::new(),
        }
    }
}

impl FactorSettings {
    /// Parameter names accepted for these settings.
    pub const FIELDS: &'static [&'static str] = &[
        "lookback",
        "lag",
        "winsor_limit",
        "do_winsor",
        "do_zscore",
        "neutralize_cols",
    ];

    /// Default settings with the given lookback window.
    #[must_use]
    pub fn with_lookback(lookback: usize) -> Self {
        Self {
            lookback: Some(lookback),
            ..Default::default()
        }
    }

    /// Minimum number of valid observations a rolling window needs.
    ///
    /// Half the lookback, at least one.
    pub fn min_periods(&self) -> usize {
        self.lookback.map_or(1, |lookback| (lookback / 2).max(1))
    }

    /// Check the parameters are within their documented ranges.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidConfig`] for a zero lookback or a winsor limit
    /// outside (0, 0.5).
    pub fn validate(&self) -> Result<()> {
        if self.lookback == Some(0) {
            return Err(RondaError::InvalidConfig(
                "lookback must be a positive number of days".to_string(),
            ));
        }
        if !(self.winsor_limit > 0.0 && self.winsor_limit < 0.5) {
            return Err(RondaError::InvalidConfig(format!(
                "winsor_limit must lie in (0, 0.5), got {}",
                self.winsor_limit
            )));
        }
        Ok(())
    }
}

/// A cross-sectional factor computed over a panel.
///
/// Implementations should be thread-safe (`Send + Sync`) so factor objects can be
/// held in a shared registry.
///
/// # Example
///
/// ```no_run
/// use ronda_traits::{Factor, FactorSettings, Panel, Result};
/// use polars::prelude::*;
///
/// #[derive(Debug)]
/// struct Range {
///     settings: FactorSettings,
/// }
///
/// impl Factor for Range {
///     fn name(&self) -> &str {
///         "range"
///     }
///
///     fn settings(&self) -> &FactorSettings {
///         &self.settings
///     }
///
///     fn required_columns(&self) -> &[&str] {
///         &["high", "low"]
///     }
///
///     fn calculate(&self, panel: &Panel) -> Result<DataFrame> {
///         let high = panel.float_column("high")?;
///         let low = panel.float_column("low")?;
///         let range: Vec<f64> = high.iter().zip(&low).map(|(h, l)| h - l).collect();
///         Ok(DataFrame::new(vec![Column::new("range".into(), range)])?)
///     }
/// }
/// ```
pub trait Factor: Send + Sync + std::fmt::Debug {
    /// Returns the name of this factor.
    ///
    /// Used for registry lookup and as the output column name.
    fn name(&self) -> &str;

    /// Returns the shared post-processing settings.
    fn settings(&self) -> &FactorSettings;

    /// Returns the panel columns this factor reads.
    ///
    /// The pipeline rejects a panel lacking any of them before calling
    /// [`Factor::calculate`].
    fn required_columns(&self) -> &[&str];

    /// Computes raw factor values.
    ///
    /// The returned frame holds one or more float columns positionally aligned to
    /// the panel's canonical rows. The pipeline keeps the column named after the
    /// factor, or the first non-key column otherwise. Rows where the value cannot
    /// be computed are NaN or null.
    ///
    /// # Errors
    ///
    /// Returns an error if a column needed only for this configuration is missing
    /// or the computation fails structurally.
    fn calculate(&self, panel: &Panel) -> Result<DataFrame>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TestFactor {
        settings: FactorSettings,
    }

    impl Factor for TestFactor {
        fn name(&self) -> &str {
            "test_factor"
        }

        fn settings(&self) -> &FactorSettings {
            &self.settings
        }

        fn required_columns(&self) -> &[&str] {
            &["close"]
        }

        fn calculate(&self, panel: &Panel) -> Result<DataFrame> {
            let close = panel.float_column("close")?;
            Ok(DataFrame::new(vec![Column::new("test_factor".into(), close)])?)
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = FactorSettings::default();
        assert_eq!(settings.lag, 1);
        assert_eq!(settings.winsor_limit, 0.01);
        assert!(!settings.do_winsor);
        assert!(!settings.do_zscore);
        assert!(settings.neutralize_cols.is_empty());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_min_periods() {
        assert_eq!(FactorSettings::with_lookback(20).min_periods(), 10);
        assert_eq!(FactorSettings::with_lookback(21).min_periods(), 10);
        assert_eq!(FactorSettings::with_lookback(1).min_periods(), 1);
        assert_eq!(FactorSettings::default().min_periods(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let settings = FactorSettings::with_lookback(0);
        assert!(matches!(
            settings.validate(),
            Err(RondaError::InvalidConfig(_))
        ));

        let settings = FactorSettings {
            winsor_limit: 0.5,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: FactorSettings =
            serde_json::from_str(r#"{"lookback": 10, "do_zscore": true}"#).unwrap();
        assert_eq!(settings.lookback, Some(10));
        assert!(settings.do_zscore);
        assert_eq!(settings.lag, 1);
    }

    #[test]
    fn test_factor_calculate() {
        let df = df! {
            "date" => &["2024-01-02", "2024-01-02"],
            "code" => &["A", "B"],
            "close" => &[1.0, 2.0],
        }
        .unwrap();
        let panel = Panel::new(df).unwrap();
        let factor = TestFactor {
            settings: FactorSettings::default(),
        };
        let out = factor.calculate(&panel).unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(factor.required_columns(), &["close"]);
    }

    #[test]
    fn test_factor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn Factor>>();
    }
}
