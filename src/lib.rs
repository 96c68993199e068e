//! micro-etl-bench library
//!
//! Cache-aware micro-ETL benchmark: a seeded synthetic event dataset is
//! persisted in several formats and aggregated (count, sum, mean of `values`
//! grouped by `event_types`) by interchangeable strategies, swept across
//! working-set sizes to expose cache effects.

pub mod benchmark;
pub mod config;
pub mod dataset;
pub mod strategy;
pub mod utils;

pub use benchmark::{run_single, sweep, RunOptions, RunOutcome, SweepHarness, SweepResult};
pub use config::BenchConfig;
pub use dataset::{generate, DataGenerator, DatasetFormat, EventBatch};
pub use strategy::{AggregateRow, AggregationStrategy, VariantRegistry};
pub use utils::{BenchmarkError, Result};
