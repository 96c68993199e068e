//! Working-set sweep
//!
//! Runs every requested variant against datasets sized to each working-set
//! target. Cells run one after another; only the strategy call is timed.
//! Sweep datasets are keyed by (variant, size) and reused when present.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::timing::measure_seconds;
use crate::config::BenchConfig;
use crate::dataset::{generate_and_save, DataGenerator};
use crate::strategy::VariantRegistry;
use crate::utils::Result;

/// Approximate encoded bytes per row used to size datasets
pub const EST_BYTES_PER_ROW: u64 = 48;

/// Rows for a working-set target, at least one
pub fn rows_for_kb(size_kb: u64) -> usize {
    ((size_kb * 1024) / EST_BYTES_PER_ROW).max(1) as usize
}

/// One (variant, size) measurement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    pub variant: String,
    pub variant_name: String,
    pub size_kb: u64,
    pub rows: usize,
    pub seconds: f64,
    pub throughput_rows_per_s: f64,
}

impl SweepResult {
    fn new(variant: &str, variant_name: &str, size_kb: u64, rows: usize, seconds: f64) -> Self {
        let throughput_rows_per_s = if seconds > 0.0 {
            rows as f64 / seconds
        } else {
            0.0
        };
        Self {
            variant: variant.to_string(),
            variant_name: variant_name.to_string(),
            size_kb,
            rows,
            seconds,
            throughput_rows_per_s,
        }
    }
}

/// Drives a sweep over a registry with a fixed configuration
pub struct SweepHarness<'a> {
    config: &'a BenchConfig,
    registry: &'a VariantRegistry,
    progress: bool,
}

impl<'a> SweepHarness<'a> {
    pub fn new(config: &'a BenchConfig, registry: &'a VariantRegistry) -> Self {
        Self {
            config,
            registry,
            progress: false,
        }
    }

    /// Show a progress bar across cells
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn progress_bar(&self, cells: u64) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(cells);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})",
        )
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }

    /// Run every (variant, size) cell in order
    ///
    /// Unknown variant ids are skipped with a warning. The first strategy
    /// or dataset error aborts the sweep.
    pub fn run(&self, variants: &[String], sizes_kb: &[u64], seed: u64) -> Result<Vec<SweepResult>> {
        let known: Vec<_> = variants
            .iter()
            .filter_map(|id| {
                let info = self.registry.get(id);
                if info.is_none() {
                    warn!("Skipping unknown variant {}", id);
                }
                info
            })
            .collect();

        let pb = self.progress_bar((known.len() * sizes_kb.len()) as u64);
        let mut results = Vec::with_capacity(known.len() * sizes_kb.len());

        for info in known {
            let format = info.default_format;
            for &size_kb in sizes_kb {
                let rows = rows_for_kb(size_kb);
                let path = self.config.sweep_dataset_path(&info.id, size_kb, format);

                if !path.exists() {
                    info!(
                        "Generating {} rows ({}KB target) for variant {} -> {}",
                        rows,
                        size_kb,
                        info.id.to_uppercase(),
                        path.display()
                    );
                    generate_and_save(
                        self.config,
                        &DataGenerator::new(seed),
                        rows,
                        format,
                        Some(path.as_path()),
                    )?;
                }

                info!(
                    "Running variant {} size={}KB rows={}",
                    info.id.to_uppercase(),
                    size_kb,
                    rows
                );
                pb.set_message(format!("{} @ {}KB", info.id, size_kb));

                let (outcome, seconds) = measure_seconds(|| info.strategy.run(&path, None));
                outcome?;
                debug!(variant = %info.id, size_kb, rows, seconds, "cell complete");

                results.push(SweepResult::new(&info.id, &info.name, size_kb, rows, seconds));
                pb.inc(1);
            }
        }

        pb.finish_with_message("done");
        Ok(results)
    }
}

/// Sweep with a hidden progress bar
pub fn sweep(
    config: &BenchConfig,
    registry: &VariantRegistry,
    variants: &[String],
    sizes_kb: &[u64],
    seed: u64,
) -> Result<Vec<SweepResult>> {
    SweepHarness::new(config, registry).run(variants, sizes_kb, seed)
}
