#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ronda/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core type and trait definitions for the Ronda factor research framework.
//!
//! This crate provides the foundational abstractions shared by factor computation
//! and evaluation: the (date, asset) [`Panel`], the [`Factor`] contract with its
//! [`FactorSettings`], the error taxonomy, and cross-sectional statistics.

/// The version of the ronda-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod factor;
pub mod stats;
pub mod types;

// Re-exports
pub use error::{Result, RondaError};
pub use factor::{Factor, FactorSettings};
pub use types::{CODE_COL, DATE_COL, Panel, PanelIndex, Symbol, float_column_from};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
