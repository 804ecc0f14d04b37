//! The shared factor pipeline.
//!
//! [`run`] wraps any [`Factor`]: it checks the panel, calls the factor's raw
//! formula, then applies the cross-sectional post-processing stages and the
//! per-asset lag configured in the factor's [`FactorSettings`].

use crate::{cross_section, neutralize::neutralize, rolling};
use polars::prelude::*;
use ronda_traits::{
    CODE_COL, DATE_COL, Factor, FactorSettings, Panel, PanelIndex, Result, RondaError,
    float_column_from,
};

/// Compute a factor over a panel.
///
/// The output has the columns `date`, `code` and the factor's name, one row per
/// panel row in canonical order. Missing values are null.
///
/// # Errors
///
/// - [`RondaError::InvalidConfig`] if the factor settings are out of range
/// - [`RondaError::MalformedPanel`] if the panel lacks a required column
/// - [`RondaError::FactorComputation`] if the raw values do not line up with the panel
/// - [`RondaError::MissingColumn`] if a neutralization column is absent
pub fn run(factor: &dyn Factor, panel: &Panel) -> Result<DataFrame> {
    let settings = factor.settings();
    settings.validate()?;

    let missing: Vec<&str> = factor
        .required_columns()
        .iter()
        .copied()
        .filter(|c| !panel.has_column(c))
        .collect();
    if !missing.is_empty() {
        return Err(RondaError::MalformedPanel(format!(
            "factor '{}' needs columns {:?}",
            factor.name(),
            missing
        )));
    }
    if !panel.is_complete() {
        log::warn!(
            "panel is not complete ({} rows for {} dates x {} assets); rolling windows will skip gaps",
            panel.len(),
            panel.index().n_dates(),
            panel.index().n_assets()
        );
    }

    let raw = factor.calculate(panel)?;
    let values = extract_factor_column(&raw, factor.name(), panel.len())?;
    let processed = post_process(panel, values, settings)?;
    let lagged = lag(panel.index(), &processed, settings.lag);

    let valid = lagged.iter().filter(|v| v.is_finite()).count();
    log::info!(
        "factor '{}': {valid} of {} values after post-processing and lag {}",
        factor.name(),
        lagged.len(),
        settings.lag
    );

    let mut out = panel.key_frame()?;
    out.with_column(float_column_from(factor.name(), &lagged))?;
    Ok(out)
}

/// Coerce a flat frame into a panel, then [`run`] the factor on it.
///
/// # Errors
///
/// Returns [`RondaError::MalformedPanel`] if the frame cannot be coerced, and any
/// error [`run`] returns.
pub fn run_frame(factor: &dyn Factor, data: DataFrame) -> Result<DataFrame> {
    let panel = Panel::new(data)?;
    run(factor, &panel)
}

/// Pick the factor's value column out of a `calculate` result.
///
/// Uses the column named `name` when present, else the first non-key column.
///
/// # Errors
///
/// Returns [`RondaError::FactorComputation`] if no value column exists or its
/// length differs from `expected_len`.
pub fn extract_factor_column(frame: &DataFrame, name: &str, expected_len: usize) -> Result<Vec<f64>> {
    let column = match frame.column(name) {
        Ok(column) => column,
        Err(_) => frame
            .get_columns()
            .iter()
            .find(|c| c.name().as_str() != DATE_COL && c.name().as_str() != CODE_COL)
            .ok_or_else(|| {
                RondaError::FactorComputation(format!("factor '{name}' returned no value column"))
            })?,
    };

    if column.len() != expected_len {
        return Err(RondaError::FactorComputation(format!(
            "factor '{name}' returned {} values for {expected_len} panel rows",
            column.len()
        )));
    }

    let casted = column.cast(&DataType::Float64)?;
    let values = casted.as_materialized_series().f64()?;
    Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Apply the enabled cross-sectional stages in order: winsorize, z-score, neutralize.
///
/// # Errors
///
/// Returns [`RondaError::MissingColumn`] if a neutralization column is absent.
pub fn post_process(panel: &Panel, values: Vec<f64>, settings: &FactorSettings) -> Result<Vec<f64>> {
    let index = panel.index();
    let mut values = values;

    if settings.do_winsor {
        let limit = settings.winsor_limit;
        values = cross_section::transform_by_date(index, &values, |xs| {
            cross_section::winsorize(xs, limit)
        });
        log::debug!("winsorized at {limit}");
    }

    if settings.do_zscore {
        values = cross_section::transform_by_date(index, &values, cross_section::zscore);
        log::debug!("z-scored by date");
    }

    if !settings.neutralize_cols.is_empty() {
        let features = settings
            .neutralize_cols
            .iter()
            .map(|name| panel.float_column(name))
            .collect::<Result<Vec<_>>>()?;
        values = neutralize(index, &values, &features);
        log::debug!("neutralized against {:?}", settings.neutralize_cols);
    }

    Ok(values)
}

/// Shift each asset's values forward by `periods` trading days.
pub fn lag(index: &PanelIndex, values: &[f64], periods: usize) -> Vec<f64> {
    rolling::shift(index, values, periods)
}
