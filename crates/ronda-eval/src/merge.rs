//! Alignment of factor values with realized forward returns.

use polars::prelude::*;
use ronda_traits::{CODE_COL, DATE_COL, Panel, Result, RondaError, float_column_from};
use std::collections::HashMap;
use std::ops::Range;

/// Name of the factor column in [`MergedData::to_dataframe`].
pub const FACTOR_COL: &str = "factor";

/// Name of the return column in [`MergedData::to_dataframe`].
pub const RETURN_COL: &str = "ret";

/// Factor values paired with forward returns, one row per (date, asset).
///
/// Rows are sorted by date then asset and never hold a NaN in either column.
#[derive(Debug, Clone, Default)]
pub struct MergedData {
    dates: Vec<String>,
    codes: Vec<String>,
    factor: Vec<f64>,
    returns: Vec<f64>,
    date_ranges: Vec<Range<usize>>,
}

impl MergedData {
    /// Build from rows already sorted by (date, code), dropping rows with a
    /// non-finite value on either side.
    pub fn from_rows(rows: impl IntoIterator<Item = (String, String, f64, f64)>) -> Self {
        let mut merged = Self::default();
        for (date, code, factor, ret) in rows {
            if !(factor.is_finite() && ret.is_finite()) {
                continue;
            }
            let row = merged.dates.len();
            if merged.dates.last() != Some(&date) {
                if let Some(range) = merged.date_ranges.last_mut() {
                    range.end = row;
                }
                merged.date_ranges.push(row..row + 1);
            }
            merged.dates.push(date);
            merged.codes.push(code);
            merged.factor.push(factor);
            merged.returns.push(ret);
        }
        if let Some(range) = merged.date_ranges.last_mut() {
            range.end = merged.dates.len();
        }
        merged
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.factor.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.factor.is_empty()
    }

    /// Date of each row.
    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    /// Asset code of each row.
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// Factor value of each row.
    pub fn factor(&self) -> &[f64] {
        &self.factor
    }

    /// Forward return of each row.
    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    /// Number of distinct dates.
    pub fn n_dates(&self) -> usize {
        self.date_ranges.len()
    }

    /// Per-date cross-sections as `(date, factor values, returns)`, in date order.
    pub fn by_date(&self) -> impl Iterator<Item = (&str, &[f64], &[f64])> + '_ {
        self.date_ranges.iter().map(|range| {
            (
                self.dates[range.start].as_str(),
                &self.factor[range.clone()],
                &self.returns[range.clone()],
            )
        })
    }

    /// The rows as a `date`, `code`, `factor`, `ret` frame.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            Column::new(DATE_COL.into(), self.dates.clone()),
            Column::new(CODE_COL.into(), self.codes.clone()),
            float_column_from(FACTOR_COL, &self.factor),
            float_column_from(RETURN_COL, &self.returns),
        ])?)
    }
}

/// Pair a factor with the panel's forward returns.
///
/// The factor frame is keyed by `date` and `code` like the panel (the
/// `trade_date`/`asset` aliases are accepted). Its value column is the one named
/// `factor_name`, else the first non-key column. Only (date, asset) pairs present
/// on both sides with finite values on both sides are kept.
///
/// # Errors
///
/// - [`RondaError::MissingColumn`] if the panel lacks `fwd_ret_col` or the factor
///   frame has no value column
/// - [`RondaError::MalformedPanel`] if the factor frame lacks key columns or
///   repeats a pair
pub fn clean_factor_and_forward_returns(
    factor: &DataFrame,
    panel: &Panel,
    factor_name: &str,
    fwd_ret_col: &str,
) -> Result<MergedData> {
    let returns = panel.float_column(fwd_ret_col)?;
    let factor = Panel::new(factor.clone())?;
    let values = factor.float_column(&value_column(&factor, factor_name)?)?;

    let panel_index = panel.index();
    let lookup: HashMap<(&str, &str), f64> = (0..panel.len())
        .filter(|&row| returns[row].is_finite())
        .map(|row| ((panel_index.date_of(row), panel_index.code_of(row)), returns[row]))
        .collect();

    let factor_index = factor.index();
    let merged = MergedData::from_rows((0..factor.len()).filter_map(|row| {
        let (date, code) = (factor_index.date_of(row), factor_index.code_of(row));
        lookup
            .get(&(date, code))
            .map(|&ret| (date.to_string(), code.to_string(), values[row], ret))
    }));

    log::debug!(
        "merged {} of {} factor rows with '{fwd_ret_col}' over {} dates",
        merged.len(),
        factor.len(),
        merged.n_dates()
    );
    Ok(merged)
}

fn value_column(factor: &Panel, factor_name: &str) -> Result<String> {
    if factor.has_column(factor_name) {
        return Ok(factor_name.to_string());
    }
    factor
        .columns()
        .into_iter()
        .find(|c| c != DATE_COL && c != CODE_COL)
        .ok_or_else(|| RondaError::MissingColumn(factor_name.to_string()))
}
