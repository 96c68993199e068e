//! Error types for micro-etl-bench

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::dataset::DatasetFormat;

/// Top-level application error
#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Corrupt dataset: {0}")]
    Corrupt(#[from] CorruptDatasetError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Unknown variant: {0}")]
    UnknownVariant(String),

    #[error("Format '{format}' not supported for variant {variant}")]
    UnsupportedFormat {
        variant: String,
        format: DatasetFormat,
    },

    #[error("Results export failed: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while persisting a batch
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("metadata too long at row {row}: {len} bytes exceeds the {max} byte limit")]
    MetadataTooLong { row: u64, len: usize, max: usize },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while reading a dataset file back into a batch
#[derive(Error, Debug)]
pub enum CorruptDatasetError {
    #[error("Invalid dataset magic: expected {expected:?}, got {actual:?}")]
    InvalidMagic { expected: Vec<u8>, actual: Vec<u8> },

    #[error("Dataset header truncated: {size} bytes, minimum {minimum} bytes")]
    TruncatedHeader { size: u64, minimum: u64 },

    #[error("Dataset truncated: expected {expected} rows, only {read} complete")]
    Truncated { expected: u64, read: u64 },

    #[error("Row {row} metadata is not valid UTF-8")]
    InvalidMetadata { row: u64 },

    #[error("Column '{column}' missing or not of type {expected}")]
    Column {
        column: &'static str,
        expected: &'static str,
    },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error at line {line}: {source}")]
    Json {
        line: u64,
        source: serde_json::Error,
    },

    #[error("Failed to open dataset: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised by an aggregation strategy
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("Dataset {} is not valid {format}: {reason}", .path.display())]
    DatasetFormat {
        path: PathBuf,
        format: DatasetFormat,
        reason: String,
    },

    #[error("Failed to write aggregate output {}: {source}", .path.display())]
    Output { path: PathBuf, source: csv::Error },

    #[error("Strategy runtime error: {0}")]
    Runtime(String),
}

impl StrategyError {
    /// Build a `DatasetFormat` error from any displayable cause
    pub fn format(
        path: impl Into<PathBuf>,
        format: DatasetFormat,
        reason: impl std::fmt::Display,
    ) -> Self {
        StrategyError::DatasetFormat {
            path: path.into(),
            format,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchmarkError>;
