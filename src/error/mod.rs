//! Error handling for the aggregation pipeline.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Errors raised while ingesting microdata or aggregating it
#[derive(Debug, thiserror::Error)]
pub enum MultigenError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error converting between record batches and rows
    #[error("Row conversion error: {0}")]
    SerdeArrow(#[from] serde_arrow::Error),

    /// Error writing a JSON report
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A survey category code outside the known code table
    #[error("Unrecognized {field} code: {code}")]
    UnknownCode {
        /// Name of the coded field
        field: &'static str,
        /// The offending code
        code: i64,
    },

    /// A weight that cannot be used as a survey replication weight
    #[error("Invalid weight {weight} in {context}: weights must be finite non-negative integers")]
    InvalidWeight {
        /// Where the weight was encountered
        context: String,
        /// The offending weight
        weight: f64,
    },

    /// Value and weight lists of different length
    #[error("Weight/value length mismatch: {values} values, {weights} weights")]
    LengthMismatch {
        /// Number of values
        values: usize,
        /// Number of weights
        weights: usize,
    },

    /// Person rows of one household disagree on a household-level field
    #[error("Inconsistent household {key}: {detail}")]
    InconsistentHousehold {
        /// Household identity
        key: String,
        /// What disagreed
        detail: String,
    },

    /// A required column is absent from an input table
    #[error("Column not found: {column}")]
    ColumnNotFound {
        /// Column name
        column: String,
    },

    /// A malformed row in a geographic reference table
    #[error("Invalid {table} row {line}: {detail}")]
    InvalidReference {
        /// Table name
        table: &'static str,
        /// 1-based line number
        line: usize,
        /// What was wrong
        detail: String,
    },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, MultigenError>;
