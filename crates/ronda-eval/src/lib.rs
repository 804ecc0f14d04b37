//! Factor evaluation for ronda.
//!
//! This crate measures how well a computed factor predicts forward returns:
//! - Alignment of factor values with a panel's forward returns
//! - Daily Information Coefficient (rank or linear) and its summary
//! - Quantile layer backtests with a long-short spread
//!
//! # Example
//!
//! ```rust,ignore
//! use ronda_eval::{EvaluatorConfig, evaluate};
//!
//! let report = evaluate(&panel, &factor, "illiquidity", "ret_fwd_1d", &EvaluatorConfig::default())?;
//! println!("IC mean {:.4}, IR {:.2}", report.summary.mean, report.summary.ir);
//! ```

pub mod backtest;
pub mod evaluator;
pub mod ic;
pub mod merge;
pub mod metrics;

// Re-export main types
pub use backtest::{LONG_SHORT_COL, LayerBacktest, LayerConfig, LayerReturns};
pub use evaluator::{EvaluationReport, EvaluatorConfig, FactorEvaluator, evaluate};
pub use ic::{IcAnalyzer, IcMethod, IcSeries, calculate_ic};
pub use merge::{MergedData, clean_factor_and_forward_returns};
pub use metrics::IcSummary;
