//! Preprocess command implementation.

use crate::data;
use anyhow::Result;
use ronda_factors::preprocess::add_status_fields;
use std::path::Path;

/// Append status and return fields to a raw quote panel and save it.
///
/// With `max_missing`, assets missing more than that share of the dates are
/// dropped first.
pub(crate) fn preprocess_panel(panel_path: &Path, out: &Path, max_missing: Option<f64>) -> Result<()> {
    let panel = data::read_complete_panel(panel_path, max_missing)?;
    let panel = add_status_fields(&panel)?;

    let mut df = panel.into_inner();
    data::write_frame(out, &mut df)?;
    println!("Wrote {} rows with status and return fields to {}", df.height(), out.display());
    Ok(())
}
