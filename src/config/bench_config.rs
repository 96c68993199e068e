//! Benchmark configuration derived from CLI arguments
//!
//! Built once at process start and passed by reference to the generator,
//! codecs and sweep harness. Nothing reads configuration from global state.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use super::cli::GlobalArgs;
use crate::dataset::DatasetFormat;

/// Default RNG seed
pub const DEFAULT_SEED: u64 = 42;

/// Default row count for `generate` and auto-generated `run` inputs
pub const DEFAULT_ROWS: usize = 1_000_000;

/// Complete benchmark configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    pub base_dir: PathBuf,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub default_rows: usize,
    pub seed: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::with_base_dir(".")
    }
}

impl BenchConfig {
    /// Configuration rooted at `base_dir` with default sub-directories
    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        Self {
            data_dir: base_dir.join("data"),
            output_dir: base_dir.join("output"),
            base_dir,
            default_rows: DEFAULT_ROWS,
            seed: DEFAULT_SEED,
        }
    }

    /// Create configuration from CLI arguments
    pub fn from_cli(args: &GlobalArgs) -> Result<Self, String> {
        if args.default_rows == 0 {
            return Err("default row count must be at least 1".to_string());
        }

        let mut config = Self::with_base_dir(&args.base_dir);
        if let Some(ref dir) = args.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(ref dir) = args.output_dir {
            config.output_dir = dir.clone();
        }
        config.default_rows = args.default_rows;
        config.seed = args.seed;
        Ok(config)
    }

    /// Create the data and output directories
    pub fn ensure_dirs(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.output_dir)
    }

    /// `{data_dir}/{label}.{ext}`
    pub fn dataset_path(&self, label: &str, format: DatasetFormat) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", label, format.extension()))
    }

    /// `{data_dir}/sweep_{variant}_{size_kb}kb.{ext}`
    pub fn sweep_dataset_path(&self, variant: &str, size_kb: u64, format: DatasetFormat) -> PathBuf {
        self.data_dir.join(format!(
            "sweep_{}_{}kb.{}",
            variant,
            size_kb,
            format.extension()
        ))
    }

    /// Default sweep results file
    pub fn sweep_results_path(&self) -> PathBuf {
        self.output_dir.join("sweep_results.csv")
    }
}

impl fmt::Display for BenchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Base Directory:   {}", self.base_dir.display())?;
        writeln!(f, "Data Directory:   {}", self.data_dir.display())?;
        writeln!(f, "Output Directory: {}", self.output_dir.display())?;
        writeln!(f, "Default Rows:     {}", self.default_rows)?;
        write!(f, "Seed:             {}", self.seed)
    }
}
