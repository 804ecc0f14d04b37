//! Common types used throughout the Ronda framework.
//!
//! The central type is [`Panel`], a (date, asset) keyed table of daily observations.
//! polars frames carry no row index, so the two index levels are the key columns
//! [`DATE_COL`] (outer) and [`CODE_COL`] (inner), and the canonical row order is
//! sorted by date then asset. Every per-date and per-asset computation in the
//! framework is expressed against the positions recorded in [`PanelIndex`], which
//! keeps intermediate results keyed identically to the panel itself.

use crate::{Result, RondaError};
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::ops::Range;

/// Name of the outer (date) key column.
pub const DATE_COL: &str = "date";

/// Name of the inner (asset code) key column.
pub const CODE_COL: &str = "code";

/// Alternative key column names accepted when coercing a flat frame.
const KEY_ALIASES: [(&str, &str); 1] = [("trade_date", "asset")];

/// An asset identifier, typically an exchange ticker such as "600000.SH".
pub type Symbol = String;

/// Row positions of a canonically ordered panel, grouped by date and by asset.
#[derive(Debug, Clone, Default)]
pub struct PanelIndex {
    /// Unique dates in chronological order.
    dates: Vec<String>,
    /// Unique asset codes in sorted order.
    codes: Vec<Symbol>,
    /// Date position for each row.
    row_date: Vec<usize>,
    /// Asset position for each row.
    row_code: Vec<usize>,
    /// Contiguous row range for each date.
    date_ranges: Vec<Range<usize>>,
    /// Chronological row positions for each asset.
    asset_rows: Vec<Vec<usize>>,
}

impl PanelIndex {
    /// Build the index from key strings of rows already sorted by (date, asset).
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::MalformedPanel`] if a (date, asset) pair repeats.
    pub fn from_sorted_keys(dates: &[String], codes: &[String]) -> Result<Self> {
        let mut index = Self::default();
        let unique: BTreeSet<&str> = codes.iter().map(String::as_str).collect();
        let code_ids: HashMap<&str, usize> =
            unique.iter().enumerate().map(|(id, &code)| (code, id)).collect();
        index.codes = unique.into_iter().map(str::to_string).collect();
        index.asset_rows = vec![Vec::new(); index.codes.len()];

        for (row, (date, code)) in dates.iter().zip(codes).enumerate() {
            let new_date = index.dates.last().is_none_or(|last| last != date);
            if new_date {
                if let Some(range) = index.date_ranges.last_mut() {
                    range.end = row;
                }
                index.dates.push(date.clone());
                index.date_ranges.push(row..row);
            }

            let code_id = code_ids[code.as_str()];

            if !new_date && index.row_code.last() == Some(&code_id) {
                return Err(RondaError::MalformedPanel(format!(
                    "duplicate (date, asset) pair ({date}, {code})"
                )));
            }

            index.row_date.push(index.dates.len() - 1);
            index.row_code.push(code_id);
            index.asset_rows[code_id].push(row);
        }

        if let Some(range) = index.date_ranges.last_mut() {
            range.end = dates.len();
        }

        Ok(index)
    }

    /// Number of rows covered by the index.
    pub fn len(&self) -> usize {
        self.row_date.len()
    }

    /// Whether the index covers no rows.
    pub fn is_empty(&self) -> bool {
        self.row_date.is_empty()
    }

    /// Unique dates in chronological order.
    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    /// Unique asset codes in sorted order.
    pub fn codes(&self) -> &[Symbol] {
        &self.codes
    }

    /// Number of distinct dates.
    pub fn n_dates(&self) -> usize {
        self.dates.len()
    }

    /// Number of distinct assets.
    pub fn n_assets(&self) -> usize {
        self.codes.len()
    }

    /// Contiguous row ranges, one per date.
    pub fn date_ranges(&self) -> &[Range<usize>] {
        &self.date_ranges
    }

    /// Chronological row positions, one list per asset.
    pub fn asset_rows(&self) -> &[Vec<usize>] {
        &self.asset_rows
    }

    /// Date key of a row.
    pub fn date_of(&self, row: usize) -> &str {
        &self.dates[self.row_date[row]]
    }

    /// Asset code of a row.
    pub fn code_of(&self, row: usize) -> &str {
        &self.codes[self.row_code[row]]
    }

    /// Whether every date carries a row for every asset.
    pub fn is_complete(&self) -> bool {
        self.len() == self.n_dates() * self.n_assets()
    }
}

/// A daily (date, asset) observation panel.
///
/// `Panel` wraps a Polars DataFrame in canonical form: key columns `date` and
/// `code`, rows sorted by date then asset, each pair present at most once.
///
/// # Expected Schema
///
/// Besides the keys, the core computations read:
/// - `close`, `high`, `low`: prices (null when not listed or suspended)
/// - `volume`, `turnover`: trading activity
/// - `market_capitalization`: optional, used for weighting
/// - `suspended`, `listed`, `ret_1d`, `ret_fwd_1d`, `ret_fwd_5d`: derived fields
///
/// Dates may be a polars `Date` column or ISO-8601 strings; either sorts
/// chronologically.
///
/// # Example
///
/// ```no_run
/// use ronda_traits::Panel;
/// use polars::prelude::*;
///
/// let df = df! {
///     "date" => &["2024-01-02", "2024-01-02"],
///     "code" => &["000001.SZ", "600000.SH"],
///     "close" => &[10.5, 7.2],
/// }.unwrap();
///
/// let panel = Panel::new(df).unwrap();
/// assert_eq!(panel.index().n_assets(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Panel {
    data: DataFrame,
    index: PanelIndex,
}

impl Panel {
    /// Coerce a flat DataFrame into a canonical panel.
    ///
    /// Key columns named `trade_date`/`asset` are renamed to `date`/`code`.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::MalformedPanel`] if the key columns are absent, contain
    /// nulls, or a (date, asset) pair occurs more than once.
    pub fn new(data: DataFrame) -> Result<Self> {
        let mut data = data;
        if !has_keys(&data) {
            for (date_alias, code_alias) in KEY_ALIASES {
                if has_column(&data, date_alias) && has_column(&data, code_alias) {
                    data.rename(date_alias, DATE_COL.into())?;
                    data.rename(code_alias, CODE_COL.into())?;
                    break;
                }
            }
        }
        if !has_keys(&data) {
            return Err(RondaError::MalformedPanel(format!(
                "panel must carry '{DATE_COL}' and '{CODE_COL}' key columns"
            )));
        }

        let data = data.sort([DATE_COL, CODE_COL], SortMultipleOptions::default())?;
        let dates = key_strings(&data, DATE_COL)?;
        let codes = key_strings(&data, CODE_COL)?;
        let index = PanelIndex::from_sorted_keys(&dates, &codes)?;

        Ok(Self { data, index })
    }

    /// Returns a reference to the underlying DataFrame.
    pub const fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Returns the (date, asset) index of the panel.
    pub const fn index(&self) -> &PanelIndex {
        &self.index
    }

    /// Consumes self and returns the underlying DataFrame.
    pub fn into_inner(self) -> DataFrame {
        self.data
    }

    /// Returns the number of rows in the panel.
    pub fn len(&self) -> usize {
        self.data.height()
    }

    /// Returns whether the panel is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the column names in the panel.
    pub fn columns(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Checks if a column exists in the panel.
    pub fn has_column(&self, name: &str) -> bool {
        has_column(&self.data, name)
    }

    /// Extracts a numeric column as floats in canonical row order, nulls as NaN.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::MissingColumn`] if the column is absent and
    /// [`RondaError::InvalidData`] if it holds text.
    pub fn float_column(&self, name: &str) -> Result<Vec<f64>> {
        let column = self
            .data
            .column(name)
            .map_err(|_| RondaError::MissingColumn(name.to_string()))?;
        if matches!(column.dtype(), DataType::String) {
            return Err(RondaError::InvalidData(format!(
                "column '{name}' is not numeric"
            )));
        }
        let casted = column.cast(&DataType::Float64)?;
        let values = casted.as_materialized_series().f64()?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }

    /// Like [`Panel::float_column`], but `None` when the column is absent.
    pub fn optional_float_column(&self, name: &str) -> Result<Option<Vec<f64>>> {
        if self.has_column(name) {
            self.float_column(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// The key columns in canonical order, with their original dtypes.
    pub fn key_frame(&self) -> Result<DataFrame> {
        Ok(self.data.select([DATE_COL, CODE_COL])?)
    }

    /// Returns a new panel with float columns appended or replaced.
    ///
    /// Values must be in canonical row order; NaN is stored as null.
    pub fn with_float_columns(&self, columns: Vec<(&str, Vec<f64>)>) -> Result<Self> {
        let mut data = self.data.clone();
        for (name, values) in columns {
            if values.len() != data.height() {
                return Err(RondaError::InvalidData(format!(
                    "column '{name}' has {} values for {} panel rows",
                    values.len(),
                    data.height()
                )));
            }
            data.with_column(float_column_from(name, &values))?;
        }
        Ok(Self {
            data,
            index: self.index.clone(),
        })
    }

    /// Whether every observed date carries a row for every observed asset.
    pub fn is_complete(&self) -> bool {
        self.index.is_complete()
    }

    /// Reindex to the full cross product of observed dates and assets.
    ///
    /// Rows added for absent pairs hold nulls in every non-key column, so that
    /// per-asset rolling windows count calendar gaps instead of skipping them.
    pub fn complete(&self) -> Result<Self> {
        if self.is_complete() {
            return Ok(self.clone());
        }

        let n_dates = self.index.n_dates();
        let n_assets = self.index.n_assets();
        let date_first: Vec<IdxSize> = self
            .index
            .date_ranges()
            .iter()
            .map(|r| r.start as IdxSize)
            .collect();
        let code_first: Vec<IdxSize> = self
            .index
            .asset_rows()
            .iter()
            .map(|rows| rows[0] as IdxSize)
            .collect();

        let mut date_take = Vec::with_capacity(n_dates * n_assets);
        let mut code_take = Vec::with_capacity(n_dates * n_assets);
        for &d in &date_first {
            for &c in &code_first {
                date_take.push(d);
                code_take.push(c);
            }
        }

        let dates = self
            .data
            .column(DATE_COL)?
            .as_materialized_series()
            .take(&IdxCa::from_vec(DATE_COL.into(), date_take))?;
        let codes = self
            .data
            .column(CODE_COL)?
            .as_materialized_series()
            .take(&IdxCa::from_vec(CODE_COL.into(), code_take))?;
        let keys = DataFrame::new(vec![Column::from(dates), Column::from(codes)])?;

        let full = keys
            .lazy()
            .join(
                self.data.clone().lazy(),
                [col(DATE_COL), col(CODE_COL)],
                [col(DATE_COL), col(CODE_COL)],
                JoinArgs::new(JoinType::Left),
            )
            .collect()?;

        log::debug!(
            "completed panel: {} rows added to reach {} dates x {} assets",
            full.height() - self.len(),
            n_dates,
            n_assets
        );
        Self::new(full)
    }

    /// Drop every asset missing more than `max_missing_ratio` of the panel's
    /// dates in any non-key column.
    ///
    /// A value is missing when the asset has no row on the date or the row holds
    /// null or NaN. An asset exactly at the ratio is kept.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidConfig`] if the ratio is outside `[0, 1]`.
    pub fn drop_sparse_assets(&self, max_missing_ratio: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&max_missing_ratio) {
            return Err(RondaError::InvalidConfig(format!(
                "max missing ratio must be within [0, 1], got {max_missing_ratio}"
            )));
        }

        let mut valid: Vec<Vec<bool>> = Vec::new();
        for name in self.columns() {
            if name == DATE_COL || name == CODE_COL {
                continue;
            }
            let column = self.data.column(&name)?;
            let flags = match column.dtype() {
                DataType::Float32 | DataType::Float64 => {
                    self.float_column(&name)?.iter().map(|v| !v.is_nan()).collect()
                }
                _ => column
                    .as_materialized_series()
                    .is_not_null()
                    .into_iter()
                    .map(|v| v.unwrap_or(false))
                    .collect(),
            };
            valid.push(flags);
        }

        let n_dates = self.index.n_dates();
        let limit = max_missing_ratio * n_dates as f64;
        let mut keep = vec![true; self.len()];
        let mut dropped = Vec::new();
        for (code, rows) in self.index.codes().iter().zip(self.index.asset_rows()) {
            let sparse = valid.iter().any(|flags| {
                let present = rows.iter().filter(|&&row| flags[row]).count();
                (n_dates - present) as f64 > limit
            });
            if sparse {
                for &row in rows {
                    keep[row] = false;
                }
                dropped.push(code.as_str());
            }
        }

        if dropped.is_empty() {
            return Ok(self.clone());
        }
        log::info!(
            "dropping {} of {} assets missing over {:.0}% of {} dates: {}",
            dropped.len(),
            self.index.n_assets(),
            max_missing_ratio * 100.0,
            n_dates,
            dropped.join(", ")
        );
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        Self::new(self.data.filter(&mask)?)
    }
}

impl TryFrom<DataFrame> for Panel {
    type Error = RondaError;

    fn try_from(data: DataFrame) -> Result<Self> {
        Self::new(data)
    }
}

impl AsRef<DataFrame> for Panel {
    fn as_ref(&self) -> &DataFrame {
        &self.data
    }
}

/// Build a nullable float column, storing NaN as null.
pub fn float_column_from(name: &str, values: &[f64]) -> Column {
    let values: Vec<Option<f64>> = values
        .iter()
        .map(|v| if v.is_nan() { None } else { Some(*v) })
        .collect();
    Column::new(name.into(), values)
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|s| s.as_str() == name)
}

fn has_keys(df: &DataFrame) -> bool {
    has_column(df, DATE_COL) && has_column(df, CODE_COL)
}

/// Key column values rendered as strings; nulls are rejected.
fn key_strings(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    let values = column.as_materialized_series().str()?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.map(str::to_string).ok_or_else(|| {
                RondaError::MalformedPanel(format!("null '{name}' key at row {row}"))
            })
        })
        .collect()
}
