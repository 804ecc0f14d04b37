//! Error types for the Ronda framework.
//!
//! Structural problems with the input (a malformed panel, a missing column, a bad
//! configuration value, registry misuse) surface as [`RondaError`] and abort the
//! operation. Numeric degeneracies such as zero variance or an unsatisfied rolling
//! window are never errors; they resolve to NaN for the affected date or asset.

use thiserror::Error;

/// The main error type for Ronda operations.
#[derive(Debug, Error)]
pub enum RondaError {
    /// The panel lacks the (date, asset) key structure or a required column.
    #[error("Malformed panel: {0}")]
    MalformedPanel(String),

    /// A column required by a specific operation is absent.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// No factor is registered under the requested name.
    #[error("Unknown factor: {0}")]
    UnknownFactor(String),

    /// A factor with this name is already registered.
    #[error("Factor already registered: {0}")]
    DuplicateName(String),

    /// The market return weighting method is not recognized.
    #[error("Unsupported weight method: {0}")]
    UnsupportedWeightMethod(String),

    /// A configuration value is out of range or cannot be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A factor's `calculate` produced output that cannot be aligned to the panel.
    #[error("Factor computation failed: {0}")]
    FactorComputation(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl From<String> for RondaError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for RondaError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for Ronda operations.
pub type Result<T> = std::result::Result<T, RondaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RondaError::MalformedPanel("missing key column 'code'".to_string());
        assert_eq!(err.to_string(), "Malformed panel: missing key column 'code'");

        let err = RondaError::MissingColumn("ret_fwd_1d".to_string());
        assert_eq!(err.to_string(), "Missing required column: ret_fwd_1d");

        let err = RondaError::UnsupportedWeightMethod("cap_sqrt".to_string());
        assert_eq!(err.to_string(), "Unsupported weight method: cap_sqrt");
    }

    #[test]
    fn test_error_from_string() {
        let err: RondaError = "boom".into();
        assert!(matches!(err, RondaError::Other(_)));
    }

    #[test]
    fn test_result_type() {
        let ok_result: Result<i32> = Ok(42);
        assert!(ok_result.is_ok());

        let err_result: Result<i32> = Err(RondaError::UnknownFactor("x".to_string()));
        assert!(err_result.is_err());
    }
}
