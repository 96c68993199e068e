//! Command-line argument parsing
//!
//! Global options (directories, row default, seed, verbosity) apply to every
//! subcommand and can also be supplied through `MICRO_ETL_*` environment
//! variables.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::dataset::DatasetFormat;

/// Working-set sizes (KB) swept when none are given
pub const DEFAULT_SIZES_KB: [u64; 5] = [16, 64, 256, 1024, 4096];

/// Cache-aware micro-ETL benchmark: hardware-to-algorithm mapping
#[derive(Parser, Debug, Clone)]
#[command(name = "micro-etl-bench")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by all subcommands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Project base directory (data/ and output/ live under it by default)
    #[arg(long = "base-dir", env = "MICRO_ETL_BASE_DIR", default_value = ".", global = true)]
    pub base_dir: PathBuf,

    /// Dataset directory (default: <base-dir>/data)
    #[arg(long = "data-dir", env = "MICRO_ETL_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Results directory (default: <base-dir>/output)
    #[arg(long = "output-dir", env = "MICRO_ETL_OUTPUT_DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Default row count for generated datasets
    #[arg(
        long = "default-rows",
        env = "MICRO_ETL_DEFAULT_ROWS",
        default_value_t = 1_000_000,
        global = true
    )]
    pub default_rows: usize,

    /// RNG seed for reproducible datasets
    #[arg(long = "seed", env = "MICRO_ETL_SEED", default_value_t = 42, global = true)]
    pub seed: u64,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Verbose output
    #[arg(long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Display resolved configuration and the variant registry
    Info,

    /// Generate a synthetic dataset
    Generate(GenerateArgs),

    /// Run a single aggregation variant
    Run(RunArgs),

    /// Sweep variants across working-set sizes
    Sweep(SweepArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Number of rows to generate (default: --default-rows)
    #[arg(short = 'r', long = "rows")]
    pub rows: Option<usize>,

    /// Output format: binary, parquet, arrow, csv, jsonl
    #[arg(short = 'f', long = "format", default_value = "parquet")]
    pub format: DatasetFormat,

    /// Output path (default: <data-dir>/synthetic.<ext>)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Variant id (see `info`)
    #[arg(short = 'v', long = "variant")]
    pub variant: String,

    /// Input dataset (default: <data-dir>/synthetic.<ext>)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Row count when auto-generating a missing input (default: --default-rows)
    #[arg(long = "rows")]
    pub rows: Option<usize>,

    /// Dataset format; must be allowed by the variant
    #[arg(short = 'f', long = "format")]
    pub format: Option<DatasetFormat>,

    /// Write aggregated rows to this CSV file
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Fail instead of generating a missing input
    #[arg(long = "no-auto-generate")]
    pub no_auto_generate: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// Variants to include (repeatable, default: all)
    #[arg(short = 'v', long = "variant")]
    pub variants: Vec<String>,

    /// Working-set sizes in KB (repeatable)
    #[arg(short = 's', long = "size-kb", default_values_t = DEFAULT_SIZES_KB)]
    pub sizes_kb: Vec<u64>,

    /// Results CSV path (default: <output-dir>/sweep_results.csv)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Also write a JSON summary to this path
    #[arg(long = "json")]
    pub json: Option<PathBuf>,

    /// Show a progress bar across sweep cells
    #[arg(long = "progress")]
    pub progress: bool,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.global.quiet && self.global.verbose {
            return Err("--quiet and --verbose are mutually exclusive".to_string());
        }

        if self.global.default_rows == 0 {
            return Err("--default-rows must be at least 1".to_string());
        }

        match &self.command {
            Command::Generate(args) if args.rows == Some(0) => {
                Err("--rows must be at least 1".to_string())
            }
            Command::Run(args) if args.rows == Some(0) => {
                Err("--rows must be at least 1".to_string())
            }
            Command::Sweep(args) if args.sizes_kb.iter().any(|&kb| kb == 0) => {
                Err("--size-kb values must be positive".to_string())
            }
            _ => Ok(()),
        }
    }
}
