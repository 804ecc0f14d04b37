//! Compute command implementation.

use crate::data;
use anyhow::{Context, Result};
use ronda_factors::{FactorParams, FactorRegistry, preprocess::add_status_fields, run};
use std::path::Path;

/// Parse `--params`, an absent value meaning all defaults.
pub(crate) fn parse_params(params: Option<&str>) -> Result<FactorParams> {
    match params {
        Some(text) => serde_json::from_str(text).context("--params must be a JSON object"),
        None => Ok(FactorParams::Null),
    }
}

/// Compute a factor over a CSV panel and save `date, code, <factor>`.
pub(crate) fn compute_factor(
    factor_name: &str,
    panel_path: &Path,
    out: &Path,
    params: Option<&str>,
    preprocess: bool,
    max_missing: Option<f64>,
) -> Result<()> {
    let registry = FactorRegistry::with_builtin();
    let factor = registry.create(factor_name, &parse_params(params)?)?;

    let mut panel = data::read_complete_panel(panel_path, max_missing)?;
    if preprocess {
        panel = add_status_fields(&panel)?;
    }

    let mut values = run(factor.as_ref(), &panel)?;
    let valid = values
        .column(factor.name())?
        .as_materialized_series()
        .f64()?
        .into_iter()
        .flatten()
        .count();

    data::write_frame(out, &mut values)?;
    println!(
        "Computed {}: {valid} of {} values, written to {}",
        factor.name(),
        values.height(),
        out.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        assert!(parse_params(None).unwrap().is_null());
        let params = parse_params(Some(r#"{"lookback": 10}"#)).unwrap();
        assert_eq!(params["lookback"], 10);
        assert!(parse_params(Some("lookback=10")).is_err());
    }
}
