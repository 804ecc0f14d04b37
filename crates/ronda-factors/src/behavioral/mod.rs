//! Behavioral factors capturing how investors react relative to the market.
//!
//! - Panic: rolling volatility of returns weighted by their divergence from the
//!   market return

mod panic;

pub use panic::{PanicConfig, PanicFactor, WeightMethod, market_return};
