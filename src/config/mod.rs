//! Configuration module

pub mod bench_config;
pub mod cli;

pub use bench_config::BenchConfig;
pub use cli::{CliArgs, Command, GenerateArgs, GlobalArgs, RunArgs, SweepArgs, DEFAULT_SIZES_KB};
