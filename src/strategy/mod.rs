//! Aggregation strategies
//!
//! Every strategy computes `count`, `sum` and `mean` of `values` grouped by
//! `event_types` from one dataset file. They differ only in how they read
//! and combine the data:
//! - RowCsv: row-at-a-time CSV parsing
//! - ArrowKernels: vectorized Arrow compute kernels over Parquet
//! - IpcColumnar: tight loops over Arrow IPC column slices
//! - ParallelColumnar: Parquet row groups aggregated on a rayon pool
//! - DataFusionSql: SQL GROUP BY on a query engine
//! - JsonLines: per-line JSON parsing
//! - StreamingCsv: fixed-size CSV chunks merged into running totals
//! - BinaryScan: zero-copy scan of the binary format
//!
//! The shared contract lives in [`AggregationStrategy::run`].

pub mod arrow_kernels;
pub mod binary_scan;
pub mod datafusion_sql;
pub mod ipc_columnar;
pub mod json_lines;
pub mod parallel_columnar;
pub mod registry;
pub mod row_csv;
pub mod streaming_csv;

use std::fs::File;
use std::io;
use std::path::Path;

use arrow_array::cast::AsArray;
use arrow_array::{ArrowPrimitiveType, PrimitiveArray, RecordBatch};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::schema::{COL_EVENT_TYPE, COL_VALUE};
use crate::dataset::DatasetFormat;
use crate::utils::StrategyError;

pub use arrow_kernels::ArrowKernelStrategy;
pub use binary_scan::BinaryScanStrategy;
pub use datafusion_sql::DataFusionSqlStrategy;
pub use ipc_columnar::IpcColumnarStrategy;
pub use json_lines::JsonLinesStrategy;
pub use parallel_columnar::ParallelColumnarStrategy;
pub use registry::{VariantInfo, VariantRegistry};
pub use row_csv::RowCsvStrategy;
pub use streaming_csv::StreamingCsvStrategy;

/// Aggregate for one event type
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateRow {
    pub event_type: u8,
    pub count: u64,
    pub sum: f64,
    pub mean: f64,
}

impl AggregateRow {
    pub fn new(event_type: u8, count: u64, sum: f64) -> Self {
        let mean = if count == 0 { 0.0 } else { sum / count as f64 };
        Self {
            event_type,
            count,
            sum,
            mean,
        }
    }
}

/// Output file header, in column order
pub const AGGREGATE_HEADER: [&str; 4] = ["event_type", "count", "sum", "mean"];

/// Pluggable aggregation over a dataset file
///
/// Implementations must not modify the input file and must return rows
/// sorted by event type with no duplicates.
pub trait AggregationStrategy: Send + Sync {
    /// Format this strategy reads
    fn input_format(&self) -> DatasetFormat;

    /// Aggregate the dataset at `path`
    fn aggregate(&self, path: &Path) -> Result<Vec<AggregateRow>, StrategyError>;

    /// Aggregate with the full contract: missing input is reported as
    /// `DatasetNotFound`, and rows are also written to `output` when given.
    fn run(&self, input: &Path, output: Option<&Path>) -> Result<Vec<AggregateRow>, StrategyError> {
        if !input.exists() {
            return Err(StrategyError::DatasetNotFound(input.to_path_buf()));
        }

        let rows = self.aggregate(input)?;
        debug!(input = %input.display(), groups = rows.len(), "aggregation complete");

        if let Some(output) = output {
            write_aggregate_csv(&rows, output)?;
        }
        Ok(rows)
    }
}

/// Running per-type totals indexed by the `u8` key
#[derive(Debug, Clone)]
pub struct GroupTotals {
    counts: [u64; 256],
    sums: [f64; 256],
}

impl Default for GroupTotals {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupTotals {
    pub fn new() -> Self {
        Self {
            counts: [0; 256],
            sums: [0.0; 256],
        }
    }

    #[inline(always)]
    pub fn add(&mut self, event_type: u8, value: f64) {
        let idx = event_type as usize;
        self.counts[idx] += 1;
        self.sums[idx] += value;
    }

    /// Add a pre-aggregated group
    #[inline]
    pub fn add_group(&mut self, event_type: u8, count: u64, sum: f64) {
        let idx = event_type as usize;
        self.counts[idx] += count;
        self.sums[idx] += sum;
    }

    pub fn merge(&mut self, other: &GroupTotals) {
        for idx in 0..256 {
            self.counts[idx] += other.counts[idx];
            self.sums[idx] += other.sums[idx];
        }
    }

    /// Total rows seen
    pub fn total_count(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Rows for observed types, ascending by type
    pub fn finish(&self) -> Vec<AggregateRow> {
        (0..=u8::MAX)
            .filter(|&t| self.counts[t as usize] > 0)
            .map(|t| AggregateRow::new(t, self.counts[t as usize], self.sums[t as usize]))
            .collect()
    }
}

/// Two-column projection shared by the row-oriented text strategies.
///
/// Extra columns are ignored by serde.
#[derive(Debug, Deserialize)]
pub(crate) struct EventProjection {
    pub event_types: u8,
    pub values: f64,
}

/// Write aggregate rows as CSV with header `event_type,count,sum,mean`
pub fn write_aggregate_csv(rows: &[AggregateRow], path: &Path) -> Result<(), StrategyError> {
    let output_err = |source: csv::Error| StrategyError::Output {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| output_err(e.into()))?;
        }
    }

    let mut writer = csv::Writer::from_path(path).map_err(output_err)?;
    if rows.is_empty() {
        writer.write_record(AGGREGATE_HEADER).map_err(output_err)?;
    }
    for row in rows {
        writer.serialize(row).map_err(output_err)?;
    }
    writer.flush().map_err(|e| output_err(e.into()))?;
    Ok(())
}

/// Open a dataset file, mapping a vanished file to `DatasetNotFound`
pub(crate) fn open_dataset(path: &Path, format: DatasetFormat) -> Result<File, StrategyError> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StrategyError::DatasetNotFound(path.to_path_buf()),
        _ => StrategyError::format(path, format, e),
    })
}

/// Typed column lookup for the grouping columns
pub(crate) fn primitive_column<'a, T: ArrowPrimitiveType>(
    batch: &'a RecordBatch,
    name: &str,
    path: &Path,
    format: DatasetFormat,
) -> Result<&'a PrimitiveArray<T>, StrategyError> {
    batch
        .column_by_name(name)
        .and_then(|col| col.as_primitive_opt::<T>())
        .ok_or_else(|| {
            StrategyError::format(
                path,
                format,
                format!(
                    "column '{}' missing or not {}",
                    name,
                    std::any::type_name::<T::Native>()
                ),
            )
        })
}

/// Check that a CSV header carries the grouping columns
pub(crate) fn require_csv_columns(
    headers: &csv::StringRecord,
    path: &Path,
) -> Result<(), StrategyError> {
    for column in [COL_EVENT_TYPE, COL_VALUE] {
        if !headers.iter().any(|h| h == column) {
            return Err(StrategyError::format(
                path,
                DatasetFormat::Csv,
                format!("missing column '{}'", column),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};

    use super::AggregateRow;
    use crate::dataset::{encode, DatasetFormat, EventBatch, EventRecord};

    /// Six events: types [0,1,0,2,1,0], values 1.0..=6.0
    pub fn reference_batch() -> EventBatch {
        let types = [0u8, 1, 0, 2, 1, 0];
        types
            .iter()
            .enumerate()
            .map(|(i, &event_type)| EventRecord {
                event_id: i as u64,
                timestamp: 1_000 + i as u64,
                user_id: 100 + i as u16,
                event_type,
                value: (i + 1) as f64,
                metadata: format!("{{\"info\": \"test_{}\"}}", i),
            })
            .collect()
    }

    pub fn write_reference(dir: &Path, format: DatasetFormat) -> PathBuf {
        let path = dir.join(format!("reference.{}", format.extension()));
        encode(&reference_batch(), format, &path).unwrap();
        path
    }

    pub fn assert_reference_rows(rows: &[AggregateRow]) {
        assert_eq!(rows.len(), 3, "rows: {:?}", rows);
        let expected = [(0u8, 3u64, 10.0f64), (1, 2, 7.0), (2, 1, 4.0)];
        for (row, (event_type, count, sum)) in rows.iter().zip(expected) {
            assert_eq!(row.event_type, event_type);
            assert_eq!(row.count, count);
            assert!((row.sum - sum).abs() < 1e-9, "sum {:?}", row);
            assert!((row.mean - sum / count as f64).abs() < 1e-9, "mean {:?}", row);
        }
        assert_eq!(rows.iter().map(|r| r.count).sum::<u64>(), 6);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_group_totals_finish_sorted() {
        let mut totals = GroupTotals::new();
        totals.add(3, 1.0);
        totals.add(0, 2.0);
        totals.add(3, 4.0);
        let rows = totals.finish();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], AggregateRow::new(0, 1, 2.0));
        assert_eq!(rows[1].event_type, 3);
        assert_eq!(rows[1].count, 2);
        assert_eq!(rows[1].mean, 2.5);
        assert_eq!(totals.total_count(), 3);
    }

    #[test]
    fn test_group_totals_merge() {
        let mut a = GroupTotals::new();
        a.add(1, 1.0);
        let mut b = GroupTotals::new();
        b.add_group(1, 4, 10.0);
        b.add(255, -1.0);
        a.merge(&b);
        let rows = a.finish();
        assert_eq!(rows, vec![AggregateRow::new(1, 5, 11.0), AggregateRow::new(255, 1, -1.0)]);
    }

    #[test]
    fn test_mean_of_empty_group() {
        assert_eq!(AggregateRow::new(0, 0, 0.0).mean, 0.0);
    }

    #[test]
    fn test_write_aggregate_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/agg.csv");
        write_aggregate_csv(
            &[AggregateRow::new(0, 2, 3.0), AggregateRow::new(1, 1, -0.5)],
            &path,
        )
        .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "event_type,count,sum,mean\n0,2,3.0,1.5\n1,1,-0.5,-0.5\n");

        let empty = dir.path().join("empty.csv");
        write_aggregate_csv(&[], &empty).unwrap();
        assert_eq!(std::fs::read_to_string(&empty).unwrap(), "event_type,count,sum,mean\n");
    }

    #[test]
    fn test_run_reports_missing_dataset() {
        let strategy = RowCsvStrategy;
        let err = strategy
            .run(Path::new("/nonexistent/dataset.csv"), None)
            .unwrap_err();
        assert!(matches!(err, StrategyError::DatasetNotFound(_)));
    }

    #[test]
    fn test_run_writes_output_and_returns_rows() {
        let dir = TempDir::new().unwrap();
        let input = test_support::write_reference(dir.path(), DatasetFormat::Csv);
        let output = dir.path().join("out/agg.csv");

        let rows = RowCsvStrategy.run(&input, Some(&output)).unwrap();
        test_support::assert_reference_rows(&rows);

        let mut reader = csv::Reader::from_path(&output).unwrap();
        assert_eq!(reader.headers().unwrap(), vec!["event_type", "count", "sum", "mean"]);
        assert_eq!(reader.records().count(), 3);
    }
}
