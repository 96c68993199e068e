//! Benchmark drivers
//!
//! - `sweep`: variants x working-set sizes, one timed strategy call per cell
//! - `single`: one variant on one dataset
//! - `results`: CSV/JSON export and console formatting

pub mod results;
pub mod single;
pub mod sweep;
pub mod timing;

pub use results::{format_count, format_throughput, results_table, write_results_csv, write_results_json};
pub use single::{run_single, RunOptions, RunOutcome};
pub use sweep::{rows_for_kb, sweep, SweepHarness, SweepResult, EST_BYTES_PER_ROW};
pub use timing::{measure_seconds, timed};
