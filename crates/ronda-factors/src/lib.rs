//! Factor computation for the ronda framework.
//!
//! This crate provides the shared factor pipeline and the concrete factors:
//! - Pipeline: winsorize, z-score and neutralize each cross-section, then lag
//! - Liquidity: illiquidity (log absolute return per unit of turnover)
//! - Behavioral: panic (volatility of returns weighted by divergence from the market)
//!
//! Factors are created by name through a [`FactorRegistry`] and run through
//! [`pipeline::run`], which returns a `date`, `code`, `<factor>` frame aligned
//! to the panel.
//!
//! # Example
//!
//! ```ignore
//! use ronda_factors::{FactorRegistry, pipeline};
//! use serde_json::json;
//!
//! let registry = FactorRegistry::with_builtin();
//! let factor = registry.create("illiquidity", &json!({"lookback": 20}))?;
//! let values = pipeline::run(factor.as_ref(), &panel)?;
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod behavioral;
pub mod cross_section;
pub mod liquidity;
pub mod neutralize;
pub mod pipeline;
pub mod preprocess;
pub mod registry;
pub mod rolling;

// Re-export key types
pub use behavioral::{PanicConfig, PanicFactor, WeightMethod, market_return};
pub use liquidity::{Illiquidity, IlliquidityConfig};
pub use pipeline::run;
pub use registry::{
    DuplicatePolicy, FactorCategory, FactorInfo, FactorParams, FactorRegistry,
    available_factors,
};
