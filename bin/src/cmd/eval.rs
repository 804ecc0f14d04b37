//! Evaluation command implementation.

use crate::data;
use anyhow::{Result, bail};
use ronda_eval::{EvaluationReport, EvaluatorConfig, IcMethod, evaluate};
use ronda_factors::preprocess::add_status_fields;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Arguments of the `eval` command.
#[derive(Debug)]
pub(crate) struct EvalArgs {
    pub(crate) panel: PathBuf,
    pub(crate) factor: PathBuf,
    pub(crate) name: String,
    pub(crate) fwd_col: String,
    pub(crate) method: IcMethod,
    pub(crate) min_assets: usize,
    pub(crate) groups: usize,
    pub(crate) format: String,
    pub(crate) layers_out: Option<PathBuf>,
    pub(crate) preprocess: bool,
}

impl EvalArgs {
    fn config(&self) -> EvaluatorConfig {
        EvaluatorConfig {
            method: self.method,
            min_assets: self.min_assets,
            groups: self.groups,
            ..Default::default()
        }
    }
}

/// Evaluate a saved factor against the panel's forward returns.
pub(crate) fn evaluate_factor(args: &EvalArgs) -> Result<()> {
    if args.format != "text" && args.format != "json" {
        bail!("unknown format '{}', expected text or json", args.format);
    }

    let mut panel = data::read_panel(&args.panel)?;
    if args.preprocess {
        panel = add_status_fields(&panel.complete()?)?;
    }
    let factor = data::read_frame(&args.factor)?;

    let report = evaluate(&panel, &factor, &args.name, &args.fwd_col, &args.config())?;

    if let Some(path) = &args.layers_out {
        let mut layers = report.layers.to_dataframe()?;
        data::write_frame(path, &mut layers)?;
    }

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report_json(&report)?)?);
    } else {
        print_report(&report, args);
    }
    Ok(())
}

/// The report with the annualized layer means attached.
fn report_json(report: &EvaluationReport) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(report)?;
    let annualized: BTreeMap<String, f64> = report.annualized_layers().into_iter().collect();
    value["annualized_layers"] = serde_json::to_value(annualized)?;
    Ok(value)
}

fn print_report(report: &EvaluationReport, args: &EvalArgs) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Factor Evaluation                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Factor:       {}", report.factor_name);
    println!("Forward:      {}", report.forward_return);
    println!("Merged rows:  {}", report.merged_rows);
    println!("Dates:        {}", report.ic.len());
    println!();

    let summary = &report.summary;
    println!("IC ({}, min {} assets)", args.method, args.min_assets);
    println!("{}", "-".repeat(40));
    println!("  Mean:       {:>10.4}", summary.mean);
    println!("  Std:        {:>10.4}", summary.std);
    println!("  IR:         {:>10.4}", summary.ir);
    println!("  Win rate:   {:>9.1}%", summary.win_rate * 100.0);
    println!("  Valid days: {:>10}", summary.valid_days);
    println!();

    println!(
        "Layers ({} groups, annualized over {} days)",
        report.layers.groups, report.trading_days_per_year
    );
    println!("{}", "-".repeat(40));
    for (name, value) in report.annualized_layers() {
        println!("  {name:11} {:>9.2}%", value * 100.0);
    }
    println!();

    if summary.valid_days == 0 {
        println!("No date had enough assets for an IC; try a lower --min-assets.\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ronda_eval::{IcSeries, IcSummary, LayerReturns};

    fn report() -> EvaluationReport {
        EvaluationReport {
            factor_name: "panic".to_string(),
            forward_return: "ret_fwd_1d".to_string(),
            merged_rows: 4,
            ic: IcSeries {
                dates: vec!["d1".to_string(), "d2".to_string()],
                values: vec![0.2, f64::NAN],
            },
            summary: IcSummary::from_values(&[0.2, f64::NAN]),
            layers: LayerReturns {
                groups: 1,
                dates: vec!["d1".to_string(), "d2".to_string()],
                buckets: vec![vec![0.01, 0.03]],
                long_short: vec![0.0, 0.0],
            },
            trading_days_per_year: 252,
        }
    }

    #[test]
    fn test_report_json_includes_annualized_layers() {
        let value = report_json(&report()).unwrap();
        assert_eq!(value["factor_name"], "panic");
        assert_eq!(value["summary"]["valid_days"], 1);
        let g1 = value["annualized_layers"]["G1"].as_f64().unwrap();
        assert!((g1 - 0.02 * 252.0).abs() < 1e-9);
        // NaN serializes as null.
        assert!(value["ic"]["values"][1].is_null());
    }

    #[test]
    fn test_args_map_to_config() {
        let args = EvalArgs {
            panel: PathBuf::from("p.csv"),
            factor: PathBuf::from("f.csv"),
            name: "panic".to_string(),
            fwd_col: "ret_fwd_5d".to_string(),
            method: IcMethod::Pearson,
            min_assets: 3,
            groups: 10,
            format: "json".to_string(),
            layers_out: None,
            preprocess: false,
        };
        let config = args.config();
        assert_eq!(config.method, IcMethod::Pearson);
        assert_eq!(config.min_assets, 3);
        assert_eq!(config.groups, 10);
        assert_eq!(config.trading_days_per_year, 252);
    }
}
