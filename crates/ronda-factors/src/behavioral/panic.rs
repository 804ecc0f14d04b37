//! Panic factor: volatility of returns weighted by their divergence from the market.

use crate::{
    registry::{FactorParams, config_from_params},
    rolling,
};
use derive_more::Display;
use polars::prelude::*;
use ronda_traits::{Factor, FactorSettings, Panel, PanelIndex, Result, RondaError, stats::nan_mean};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Damping constant in the panic score denominator.
const PANIC_DAMPING: f64 = 0.1;

/// How the daily market return is averaged across assets.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightMethod {
    /// Plain mean of the available returns.
    #[default]
    #[display("equal")]
    Equal,
    /// Weighted by `market_capitalization`.
    #[display("market_cap")]
    MarketCap,
    /// Weighted by `turnover`.
    #[display("turnover")]
    Turnover,
}

impl WeightMethod {
    /// The panel column holding the weights, if any.
    #[must_use]
    pub const fn weight_column(&self) -> Option<&'static str> {
        match self {
            Self::Equal => None,
            Self::MarketCap => Some("market_capitalization"),
            Self::Turnover => Some("turnover"),
        }
    }
}

impl FromStr for WeightMethod {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "equal" => Ok(Self::Equal),
            "market_cap" => Ok(Self::MarketCap),
            "turnover" => Ok(Self::Turnover),
            other => Err(RondaError::UnsupportedWeightMethod(other.to_string())),
        }
    }
}

/// Configuration for the panic factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanicConfig {
    /// Window and post-processing settings; the lookback defaults to 21 trading days.
    #[serde(flatten)]
    pub settings: FactorSettings,
    /// Market return weighting.
    #[serde(default)]
    pub weight_method: WeightMethod,
}

impl Default for PanicConfig {
    fn default() -> Self {
        Self {
            settings: FactorSettings::with_lookback(PanicFactor::DEFAULT_LOOKBACK),
            weight_method: WeightMethod::default(),
        }
    }
}

/// Panic factor.
///
/// # Computation
///
/// For each asset and date:
/// 1. `r_i = close_t / close_{t-1} - 1`
/// 2. `r_m`: the market return of the date under the configured [`WeightMethod`]
/// 3. `panic = |r_i - r_m| / (|r_i| + |r_m| + 0.1)`
/// 4. `x = panic * r_i`
/// 5. factor = rolling sample standard deviation of `x` over `lookback` rows,
///    with at least `lookback / 2` valid points
///
/// NaN on days with a missing close.
#[derive(Debug, Clone)]
pub struct PanicFactor {
    config: PanicConfig,
}

impl PanicFactor {
    /// Registry name.
    pub const NAME: &'static str = "panic";

    /// Lookback used when none is configured.
    pub const DEFAULT_LOOKBACK: usize = 21;

    /// Create a panic factor with the given configuration.
    #[must_use]
    pub fn new(config: PanicConfig) -> Self {
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
    /// Returns [`RondaError::UnsupportedWeightMethod`] for an unknown
    /// `weight_method` and [`RondaError::InvalidConfig`] for other bad parameters.
    pub fn from_params(params: &FactorParams) -> Result<Self> {
        match params.get("weight_method") {
            None => {}
            Some(FactorParams::String(method)) => {
                WeightMethod::from_str(method)?;
            }
            Some(other) => {
                return Err(RondaError::UnsupportedWeightMethod(other.to_string()));
            }
        }
        let fields: Vec<&str> =
            FactorSettings::FIELDS.iter().copied().chain(["weight_method"]).collect();
        Ok(Self::new(config_from_params(params, &fields)?))
    }

    /// Rolling window length in trading days.
    #[must_use]
    pub fn lookback(&self) -> usize {
        self.config
            .settings
            .lookback
            .unwrap_or(Self::DEFAULT_LOOKBACK)
    }

    /// The market return weighting.
    #[must_use]
    pub const fn weight_method(&self) -> WeightMethod {
        self.config.weight_method
    }
}

impl Default for PanicFactor {
    fn default() -> Self {
        Self::new(PanicConfig::default())
    }
}

impl Factor for PanicFactor {
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
        let returns = rolling::pct_change(index, &close);
        let market = market_return(panel, &returns, self.config.weight_method)?;

        let weighted: Vec<f64> = returns
            .iter()
            .zip(&market)
            .map(|(&ri, &rm)| {
                let panic = (ri - rm).abs() / (ri.abs() + rm.abs() + PANIC_DAMPING);
                panic * ri
            })
            .collect();

        let mut values = rolling::rolling_std(
            index,
            &weighted,
            self.lookback(),
            self.config.settings.min_periods(),
        );
        for (value, price) in values.iter_mut().zip(&close) {
            if price.is_nan() {
                *value = f64::NAN;
            }
        }

        Ok(DataFrame::new(vec![Column::new(Self::NAME.into(), values)])?)
    }
}

/// The market return of each row's date, broadcast to every row of the date.
///
/// # Errors
///
/// Returns [`RondaError::MissingColumn`] if the weighting column is absent and
/// [`RondaError::InvalidData`] if `returns` does not have one value per row.
pub fn market_return(panel: &Panel, returns: &[f64], method: WeightMethod) -> Result<Vec<f64>> {
    if returns.len() != panel.len() {
        return Err(RondaError::InvalidData(format!(
            "{} returns for a panel of {} rows",
            returns.len(),
            panel.len()
        )));
    }
    let weights = match method.weight_column() {
        Some(column) => Some(panel.float_column(column)?),
        None => None,
    };
    Ok(broadcast_by_date(panel.index(), |range| match &weights {
        None => nan_mean(&returns[range]),
        Some(weights) => weighted_mean(&returns[range.clone()], &weights[range]),
    }))
}

/// Mean of `values` weighted by `weights`, over pairs where both are finite.
///
/// NaN when no pair is valid or the weights sum to zero.
fn weighted_mean(values: &[f64], weights: &[f64]) -> f64 {
    let (sum, total) = values
        .iter()
        .zip(weights)
        .filter(|(v, w)| v.is_finite() && w.is_finite())
        .fold((0.0, 0.0), |(s, t), (v, w)| (s + v * w, t + w));
    if total == 0.0 { f64::NAN } else { sum / total }
}

fn broadcast_by_date<F>(index: &PanelIndex, mut per_date: F) -> Vec<f64>
where
    F: FnMut(std::ops::Range<usize>) -> f64,
{
    let mut out = vec![f64::NAN; index.len()];
    for range in index.date_ranges() {
        let value = per_date(range.clone());
        out[range.clone()].fill(value);
    }
    out
}
