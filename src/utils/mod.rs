//! Utility modules

pub mod error;

pub use error::{BenchmarkError, CorruptDatasetError, EncodingError, Result, StrategyError};
