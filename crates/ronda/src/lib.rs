#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ronda/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # ronda
//!
//! Cross-sectional factor research for daily equity panels.
//!
//! ronda is an umbrella crate that re-exports all ronda sub-crates for convenience.
//! It covers the whole research loop: a (date, asset) keyed [`Panel`], factors
//! computed through a shared post-processing pipeline, and evaluation of the
//! resulting factor against forward returns.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ronda::prelude::*;
//! use serde_json::json;
//!
//! # fn main() -> ronda::Result<()> {
//! let panel = ronda::factors::preprocess::add_status_fields(&Panel::new(frame)?)?;
//!
//! let registry = FactorRegistry::with_builtin();
//! let factor = registry.create("illiquidity", &json!({"lookback": 20}))?;
//! let values = ronda::factors::run(factor.as_ref(), &panel)?;
//!
//! let report = evaluate(&panel, &values, factor.name(), "ret_fwd_1d", &EvaluatorConfig::default())?;
//! println!("IC {:.4}  IR {:.2}", report.summary.mean, report.summary.ir);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Panel model, [`Factor`] contract, errors and statistics
//! - [`factors`] - Factor pipeline, registry, preprocessing and concrete factors
//! - [`eval`] - Forward return alignment, IC analysis and layer backtests
//!
//! ## Architecture
//!
//! 1. **Panels** hold daily observations keyed by date then asset
//! 2. **Factors** compute a raw value per row; the pipeline winsorizes, z-scores,
//!    neutralizes and lags it
//! 3. **Evaluation** pairs factor values with forward returns and measures the
//!    daily IC and the returns of factor-sorted buckets

/// Version information for the ronda crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Core Types
// ============================================================================

/// Core type and trait definitions.
///
/// - [`Panel`] - (date, asset) keyed table of daily observations
/// - [`Factor`] - contract every factor implements
/// - [`FactorSettings`] - shared window and post-processing settings
pub mod traits {
    pub use ronda_traits::*;
}

pub use ronda_traits::{Factor, FactorSettings, Panel, PanelIndex, Result, RondaError};

// ============================================================================
// Factors
// ============================================================================

/// Factor computation.
///
/// ## Available Factors
///
/// - **illiquidity**: log absolute return per unit of turnover
/// - **panic**: volatility of returns weighted by their divergence from the market
///
/// Factors are built by name from a [`FactorRegistry`](ronda_factors::FactorRegistry)
/// and run through [`run`](ronda_factors::run).
pub mod factors {
    pub use ronda_factors::*;
}

// ============================================================================
// Evaluation
// ============================================================================

/// Factor evaluation.
///
/// ## Information Coefficient (IC)
///
/// Cross-sectional correlation of factor values with forward returns, per date:
///
/// ```text
/// IC_t = corr(rank(factor_t), rank(ret_fwd_t))
/// IR   = mean(IC) / std(IC)
/// ```
///
/// ## Layer Backtest
///
/// Each date's assets are split into `groups` equal-frequency buckets by factor
/// value; the table holds each bucket's mean forward return and the spread
/// between the top and bottom buckets.
pub mod eval {
    pub use ronda_eval::*;
}

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use ronda::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Factor, FactorSettings, Panel, Result, RondaError};
    pub use ronda_eval::{EvaluationReport, EvaluatorConfig, IcMethod, evaluate};
    pub use ronda_factors::{FactorRegistry, Illiquidity, PanicFactor, WeightMethod};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
    }

    #[test]
    fn test_re_exports() {
        fn _accept_factor(_factor: &dyn Factor) {}

        let registry = factors::FactorRegistry::with_builtin();
        assert!(registry.contains("illiquidity"));
        assert!(registry.contains("panic"));
        assert_eq!(eval::EvaluatorConfig::default().groups, 5);
    }

    #[test]
    fn test_error_types() {
        let _result: Result<()> = Ok(());
        let _error = RondaError::UnknownFactor("momentum".to_string());
    }
}
