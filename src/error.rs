//! Error types for the random walk analysis library.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Main error type of the library.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Bad aggregation length, too-short series or invalid prices.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Fetching or parsing input data failed. The source error is kept as is.
    #[error(transparent)]
    DataAcquisition(#[from] DataError),

    /// A zero (or non-finite) variance makes a ratio undefined.
    #[error("Numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AnalysisError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AnalysisError::InvalidParameter(message.into())
    }

    pub fn degenerate(message: impl Into<String>) -> Self {
        AnalysisError::NumericDegeneracy(message.into())
    }
}

/// Failures of the data sources (CSV files and the market data API).
#[derive(Error, Debug)]
pub enum DataError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned error: {code} - {message}")]
    Provider { code: i32, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse record {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("No data returned")]
    NoData,
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::DataAcquisition(DataError::Io(err))
    }
}

impl From<csv::Error> for AnalysisError {
    fn from(err: csv::Error) -> Self {
        AnalysisError::DataAcquisition(DataError::Csv(err))
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        AnalysisError::DataAcquisition(DataError::Http(err))
    }
}
