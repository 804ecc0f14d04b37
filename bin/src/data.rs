//! CSV loading and saving for the Ronda CLI.

use anyhow::{Context, Result};
use polars::prelude::*;
use ronda_traits::Panel;
use std::fs::File;
use std::path::Path;

/// Columns kept as text; every other column is read as a float.
const KEY_COLUMNS: [&str; 4] = ["date", "code", "trade_date", "asset"];

/// Load a CSV file as a frame with text keys and float values.
///
/// Every field is read as text first so that asset codes such as "000001.SZ" or
/// "000001" keep their leading zeros. Values that do not parse as numbers become
/// null.
pub(crate) fn read_frame(path: &Path) -> Result<DataFrame> {
    let raw = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("cannot open {}", path.display()))?
        .finish()
        .with_context(|| format!("cannot parse {}", path.display()))?;

    let values: Vec<Expr> = raw
        .get_column_names()
        .iter()
        .filter(|name| !KEY_COLUMNS.contains(&name.as_str()))
        .map(|name| col(name.as_str()).cast(DataType::Float64))
        .collect();

    let df = raw.lazy().with_columns(values).collect()?;
    log::debug!("read {} rows x {} columns from {}", df.height(), df.width(), path.display());
    Ok(df)
}

/// Load a CSV file as a panel.
pub(crate) fn read_panel(path: &Path) -> Result<Panel> {
    let panel = Panel::new(read_frame(path)?)
        .with_context(|| format!("{} is not a (date, code) panel", path.display()))?;
    log::info!(
        "loaded {}: {} rows, {} dates, {} assets",
        path.display(),
        panel.len(),
        panel.index().n_dates(),
        panel.index().n_assets()
    );
    Ok(panel)
}

/// Load a CSV panel, drop sparse assets if asked, and fill in absent pairs.
pub(crate) fn read_complete_panel(path: &Path, max_missing: Option<f64>) -> Result<Panel> {
    let mut panel = read_panel(path)?;
    if let Some(ratio) = max_missing {
        panel = panel.drop_sparse_assets(ratio)?;
    }
    Ok(panel.complete()?)
}

/// Write a frame to a CSV file with a header row.
pub(crate) fn write_frame(path: &Path, df: &mut DataFrame) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("cannot write {}", path.display()))?;
    log::info!("wrote {} rows to {}", df.height(), path.display());
    Ok(())
}
