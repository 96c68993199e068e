//! Single-variant run

use std::path::PathBuf;

use tracing::info;

use super::timing::measure_seconds;
use crate::config::BenchConfig;
use crate::dataset::{generate_and_save, DataGenerator, DatasetFormat};
use crate::strategy::{AggregateRow, VariantRegistry};
use crate::utils::{BenchmarkError, Result, StrategyError};

/// Options for one run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub variant: String,
    /// Dataset path; defaults to `{data_dir}/synthetic.{ext}`
    pub input: Option<PathBuf>,
    /// Rows to generate when the input is missing; defaults to `default_rows`
    pub rows: Option<usize>,
    /// Dataset format; defaults to the variant's default format
    pub format: Option<DatasetFormat>,
    /// Aggregate output CSV
    pub output: Option<PathBuf>,
    /// Generate a missing input instead of failing
    pub auto_generate: bool,
}

/// Result of one run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub variant: String,
    pub variant_name: String,
    pub input: PathBuf,
    pub format: DatasetFormat,
    /// Whether the input was generated by this run
    pub generated: bool,
    pub rows: Vec<AggregateRow>,
    pub seconds: f64,
}

/// Run one variant once
///
/// An unknown variant or a format outside the variant's allowed set is a
/// configuration error. A missing input is generated with the configured
/// seed when `auto_generate` is set, otherwise `DatasetNotFound`.
pub fn run_single(
    config: &BenchConfig,
    registry: &VariantRegistry,
    options: &RunOptions,
) -> Result<RunOutcome> {
    let info = registry
        .get(&options.variant)
        .ok_or_else(|| BenchmarkError::UnknownVariant(options.variant.clone()))?;

    let format = options.format.unwrap_or(info.default_format);
    if !info.allows(format) {
        return Err(BenchmarkError::UnsupportedFormat {
            variant: info.id.to_uppercase(),
            format,
        });
    }

    let input = options
        .input
        .clone()
        .unwrap_or_else(|| config.dataset_path("synthetic", format));

    let mut generated = false;
    if !input.exists() {
        if !options.auto_generate {
            return Err(StrategyError::DatasetNotFound(input).into());
        }
        let rows = options.rows.unwrap_or(config.default_rows);
        if rows == 0 {
            return Err(BenchmarkError::Config(
                "row count for auto-generation must be at least 1".to_string(),
            ));
        }
        info!("Auto-generating {} rows as {} at {}", rows, format, input.display());
        generate_and_save(
            config,
            &DataGenerator::new(config.seed),
            rows,
            format,
            Some(input.as_path()),
        )?;
        generated = true;
    }

    info!(
        "Running variant {} ({}) on {}",
        info.id.to_uppercase(),
        info.name,
        input.display()
    );
    let (rows, seconds) =
        measure_seconds(|| info.strategy.run(&input, options.output.as_deref()));
    let rows = rows?;

    Ok(RunOutcome {
        variant: info.id.clone(),
        variant_name: info.name.clone(),
        input,
        format,
        generated,
        rows,
        seconds,
    })
}
