//! One-call factor evaluation.
//!
//! Merges a factor with the panel's forward returns, then runs the daily IC
//! analysis and the quantile layer backtest over the merged rows.

use crate::{
    backtest::{LayerBacktest, LayerConfig, LayerReturns},
    ic::{IcAnalyzer, IcMethod, IcSeries},
    merge::clean_factor_and_forward_returns,
    metrics::IcSummary,
};
use polars::prelude::DataFrame;
use ronda_traits::{Panel, Result, RondaError};
use serde::{Deserialize, Serialize};

/// Configuration for factor evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Correlation used for the daily IC
    pub method: IcMethod,
    /// Dates with fewer merged assets get a NaN IC
    pub min_assets: usize,
    /// Number of quantile buckets in the layer backtest
    pub groups: usize,
    /// Trading days per year for annualization
    pub trading_days_per_year: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            method: IcMethod::Spearman,
            min_assets: 10,
            groups: 5,
            trading_days_per_year: 252,
        }
    }
}

impl EvaluatorConfig {
    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidConfig`] if `groups` or `trading_days_per_year`
    /// is zero.
    pub fn validate(&self) -> Result<()> {
        if self.groups == 0 {
            return Err(RondaError::InvalidConfig("groups must be positive".to_string()));
        }
        if self.trading_days_per_year == 0 {
            return Err(RondaError::InvalidConfig(
                "trading_days_per_year must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of evaluating one factor against one forward return column.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    /// Evaluated factor
    pub factor_name: String,
    /// Forward return column the factor was paired with
    pub forward_return: String,
    /// Number of (date, asset) rows with both a factor value and a return
    pub merged_rows: usize,
    /// Daily IC
    pub ic: IcSeries,
    /// IC summary statistics
    pub summary: IcSummary,
    /// Daily bucket returns
    pub layers: LayerReturns,
    /// Trading days per year used by [`Self::annualized_layers`]
    pub trading_days_per_year: usize,
}

impl EvaluationReport {
    /// Annualized mean return of every bucket and of the long-short spread.
    pub fn annualized_layers(&self) -> Vec<(String, f64)> {
        self.layers.annualized(self.trading_days_per_year)
    }
}

/// Evaluates factor frames against a panel.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactorEvaluator {
    config: EvaluatorConfig,
}

impl FactorEvaluator {
    /// Create an evaluator.
    pub const fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    /// The evaluator's configuration.
    pub const fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Evaluate a factor frame, see [`evaluate`].
    pub fn evaluate(
        &self,
        panel: &Panel,
        factor: &DataFrame,
        factor_name: &str,
        fwd_ret_col: &str,
    ) -> Result<EvaluationReport> {
        evaluate(panel, factor, factor_name, fwd_ret_col, &self.config)
    }
}

/// Evaluate a factor against a forward return column of the panel.
///
/// # Errors
///
/// - [`RondaError::InvalidConfig`] if the configuration is invalid
/// - [`RondaError::MissingColumn`] if the panel lacks `fwd_ret_col` or the factor
///   frame has no value column
/// - [`RondaError::MalformedPanel`] if the factor frame lacks key columns
pub fn evaluate(
    panel: &Panel,
    factor: &DataFrame,
    factor_name: &str,
    fwd_ret_col: &str,
    config: &EvaluatorConfig,
) -> Result<EvaluationReport> {
    config.validate()?;

    let merged = clean_factor_and_forward_returns(factor, panel, factor_name, fwd_ret_col)?;
    if merged.is_empty() {
        log::warn!("{factor_name}: no rows left after merging with '{fwd_ret_col}'");
    }

    let (ic, summary) = IcAnalyzer::new(&merged).analyze(config.method, config.min_assets);
    let layers = LayerBacktest::new(LayerConfig { groups: config.groups }).run(&merged)?;

    log::info!(
        "{factor_name} vs {fwd_ret_col}: {} rows, IC mean {:.4}, IR {:.4}, {} valid days",
        merged.len(),
        summary.mean,
        summary.ir,
        summary.valid_days
    );

    Ok(EvaluationReport {
        factor_name: factor_name.to_string(),
        forward_return: fwd_ret_col.to_string(),
        merged_rows: merged.len(),
        ic,
        summary,
        layers,
        trading_days_per_year: config.trading_days_per_year,
    })
}
