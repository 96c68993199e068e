//! Parallel aggregation over Parquet row groups
//!
//! Each row group is read and aggregated independently on the rayon pool and
//! the partial totals are merged. The caller only sees a shorter elapsed
//! time; no threads outlive the call.

use std::path::Path;

use arrow_array::types::{Float64Type, UInt8Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use rayon::prelude::*;

use super::{open_dataset, primitive_column, AggregateRow, AggregationStrategy, GroupTotals};
use crate::dataset::schema::{COL_EVENT_TYPE, COL_VALUE};
use crate::dataset::DatasetFormat;
use crate::utils::StrategyError;

#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelColumnarStrategy;

impl ParallelColumnarStrategy {
    fn aggregate_row_group(path: &Path, row_group: usize) -> Result<GroupTotals, StrategyError> {
        let format = DatasetFormat::Parquet;
        let file = open_dataset(path, format)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| StrategyError::format(path, format, e))?;
        let projection = [COL_EVENT_TYPE, COL_VALUE]
            .iter()
            .map(|name| builder.schema().index_of(name))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StrategyError::format(path, format, e))?;
        let mask = ProjectionMask::roots(builder.parquet_schema(), projection);
        let reader = builder
            .with_row_groups(vec![row_group])
            .with_projection(mask)
            .build()
            .map_err(|e| StrategyError::format(path, format, e))?;

        let mut totals = GroupTotals::new();
        for batch in reader {
            let batch = batch.map_err(|e| StrategyError::format(path, format, e))?;
            let types = primitive_column::<UInt8Type>(&batch, COL_EVENT_TYPE, path, format)?;
            let values = primitive_column::<Float64Type>(&batch, COL_VALUE, path, format)?;
            for (&t, &v) in types.values().iter().zip(values.values().iter()) {
                totals.add(t, v);
            }
        }
        Ok(totals)
    }
}

impl AggregationStrategy for ParallelColumnarStrategy {
    fn input_format(&self) -> DatasetFormat {
        DatasetFormat::Parquet
    }

    fn aggregate(&self, path: &Path) -> Result<Vec<AggregateRow>, StrategyError> {
        let format = DatasetFormat::Parquet;
        let file = open_dataset(path, format)?;
        let row_groups = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| StrategyError::format(path, format, e))?
            .metadata()
            .num_row_groups();

        let totals = (0..row_groups)
            .into_par_iter()
            .map(|row_group| Self::aggregate_row_group(path, row_group))
            .try_reduce(GroupTotals::new, |mut acc, partial| {
                acc.merge(&partial);
                Ok(acc)
            })?;
        Ok(totals.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tabular::PARQUET_ROW_GROUP_SIZE;
    use crate::dataset::{encode, generate};
    use crate::strategy::test_support::{assert_reference_rows, write_reference};
    use crate::strategy::ArrowKernelStrategy;
    use tempfile::TempDir;

    #[test]
    fn test_reference_aggregation() {
        let dir = TempDir::new().unwrap();
        let path = write_reference(dir.path(), DatasetFormat::Parquet);
        assert_reference_rows(&ParallelColumnarStrategy.aggregate(&path).unwrap());
    }

    #[test]
    fn test_multiple_row_groups_match_serial() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("groups.parquet");
        let rows = PARQUET_ROW_GROUP_SIZE * 3 + 17;
        encode(&generate(13, rows), DatasetFormat::Parquet, &path).unwrap();

        let parallel = ParallelColumnarStrategy.aggregate(&path).unwrap();
        let serial = ArrowKernelStrategy.aggregate(&path).unwrap();
        assert_eq!(parallel.len(), serial.len());
        for (p, s) in parallel.iter().zip(&serial) {
            assert_eq!(p.event_type, s.event_type);
            assert_eq!(p.count, s.count);
            assert!((p.sum - s.sum).abs() < 1e-6);
        }
        assert_eq!(parallel.iter().map(|r| r.count).sum::<u64>(), rows as u64);
    }

    #[test]
    fn test_empty_dataset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.parquet");
        encode(&generate(1, 0), DatasetFormat::Parquet, &path).unwrap();
        assert!(ParallelColumnarStrategy.aggregate(&path).unwrap().is_empty());
    }
}
