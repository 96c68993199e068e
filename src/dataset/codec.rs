//! Format dispatch and atomic dataset writes
//!
//! Encoders write into a temporary file in the destination directory that is
//! renamed over the target only after the encoder succeeds. A failed encode
//! therefore leaves nothing at the target path for a later sweep to reuse.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::binary_dataset::{read_binary, write_binary};
use super::generator::DataGenerator;
use super::schema::{DatasetFormat, EventBatch};
use super::tabular;
use crate::config::BenchConfig;
use crate::utils::{CorruptDatasetError, EncodingError, Result};

/// Encode `batch` as `format` at `path`
pub fn encode(batch: &EventBatch, format: DatasetFormat, path: &Path) -> std::result::Result<(), EncodingError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        match format {
            DatasetFormat::Binary => write_binary(batch, &mut writer)?,
            DatasetFormat::Parquet => tabular::write_parquet(batch, &mut writer)?,
            DatasetFormat::Arrow => tabular::write_arrow(batch, &mut writer)?,
            DatasetFormat::Csv => tabular::write_csv(batch, &mut writer)?,
            DatasetFormat::Jsonl => tabular::write_jsonl(batch, &mut writer)?,
        }
        writer.into_inner().map_err(|e| e.into_error())?;
    }

    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    debug!(path = %path.display(), %format, rows = batch.len(), "dataset written");
    Ok(())
}

/// Decode the dataset at `path`, interpreting it as `format`
pub fn decode(path: &Path, format: DatasetFormat) -> std::result::Result<EventBatch, CorruptDatasetError> {
    match format {
        DatasetFormat::Binary => read_binary(path),
        DatasetFormat::Parquet => tabular::read_parquet(path),
        DatasetFormat::Arrow => tabular::read_arrow(path),
        DatasetFormat::Csv => tabular::read_csv(path),
        DatasetFormat::Jsonl => tabular::read_jsonl(path),
    }
}

/// Generate `rows` events with `generator` and persist them
///
/// Writes to `output` if given, otherwise `{data_dir}/synthetic.{ext}`.
/// The parent directory is created if needed.
pub fn generate_and_save(
    config: &BenchConfig,
    generator: &DataGenerator,
    rows: usize,
    format: DatasetFormat,
    output: Option<&Path>,
) -> Result<PathBuf> {
    let target = match output {
        Some(path) => path.to_path_buf(),
        None => config.dataset_path("synthetic", format),
    };
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let batch = generator.generate(rows);
    encode(&batch, format, &target)?;
    info!(
        "Generated {} rows as {} at {}",
        rows,
        format,
        target.display()
    );
    Ok(target)
}
