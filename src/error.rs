//! Error type shared by the library modules.

use polars::prelude::PolarsError;

/// Everything that can go wrong while loading data or running a backtest.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid user input such as an inverted year range or an unknown factor.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Missing column '{0}'")]
    MissingColumn(String),

    /// A data source returned nothing usable.
    #[error("No data: {0}")]
    NoData(String),
}

pub type Result<T> = std::result::Result<T, BacktestError>;
