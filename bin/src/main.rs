//! Ronda CLI binary.
//!
//! Provides a command-line interface for computing and evaluating factors over
//! CSV panels of daily quotes.

mod cmd;
mod data;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ronda_eval::IcMethod;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "ronda")]
#[command(about = "Cross-sectional factor research for daily equity panels", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available factors
    Factors {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Append status and return fields to a raw quote panel
    Preprocess {
        /// Panel CSV with date, code, close and volume columns
        #[arg(long)]
        panel: PathBuf,

        /// Output CSV
        #[arg(short, long)]
        out: PathBuf,

        /// Drop assets missing more than this share of the dates, e.g. 0.5
        #[arg(long)]
        max_missing: Option<f64>,
    },

    /// Compute a factor over a panel
    Compute {
        /// Factor name
        factor: String,

        /// Panel CSV
        #[arg(long)]
        panel: PathBuf,

        /// Output CSV (date, code, factor)
        #[arg(short, long)]
        out: PathBuf,

        /// Factor parameters as a JSON object, e.g. '{"lookback": 10}'
        #[arg(long)]
        params: Option<String>,

        /// Derive status and return fields before computing
        #[arg(long)]
        preprocess: bool,

        /// Drop assets missing more than this share of the dates, e.g. 0.5
        #[arg(long)]
        max_missing: Option<f64>,
    },

    /// Evaluate a factor against forward returns
    Eval {
        /// Panel CSV holding the forward return column
        #[arg(long)]
        panel: PathBuf,

        /// Factor CSV (date, code, factor)
        #[arg(long)]
        factor: PathBuf,

        /// Factor name, the value column of the factor CSV
        #[arg(short, long)]
        name: String,

        /// Forward return column of the panel
        #[arg(long, default_value = "ret_fwd_1d")]
        fwd_col: String,

        /// IC method (spearman or pearson)
        #[arg(short, long, default_value = "spearman")]
        method: IcMethod,

        /// Minimum assets on a date for its IC to count
        #[arg(long, default_value = "10")]
        min_assets: usize,

        /// Number of quantile groups in the layer backtest
        #[arg(short, long, default_value = "5")]
        groups: usize,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,

        /// Write the daily layer returns to this CSV
        #[arg(long)]
        layers_out: Option<PathBuf>,

        /// Derive forward returns from raw quotes first
        #[arg(long)]
        preprocess: bool,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Factors { verbose } => {
            cmd::factors::list_factors(verbose);
        }
        Commands::Preprocess {
            panel,
            out,
            max_missing,
        } => {
            cmd::preprocess::preprocess_panel(&panel, &out, max_missing)?;
        }
        Commands::Compute {
            factor,
            panel,
            out,
            params,
            preprocess,
            max_missing,
        } => {
            cmd::compute::compute_factor(
                &factor,
                &panel,
                &out,
                params.as_deref(),
                preprocess,
                max_missing,
            )?;
        }
        Commands::Eval {
            panel,
            factor,
            name,
            fwd_col,
            method,
            min_assets,
            groups,
            format,
            layers_out,
            preprocess,
        } => {
            let args = cmd::eval::EvalArgs {
                panel,
                factor,
                name,
                fwd_col,
                method,
                min_assets,
                groups,
                format,
                layers_out,
                preprocess,
            };
            cmd::eval::evaluate_factor(&args)?;
        }
    }

    Ok(())
}
