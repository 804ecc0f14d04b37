//! Liquidity factors based on price impact per unit of trading activity.
//!
//! - Illiquidity: rolling log absolute return over rolling turnover

mod illiquidity;

pub use illiquidity::{Illiquidity, IlliquidityConfig};
