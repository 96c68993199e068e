//! SQL GROUP BY through DataFusion
//!
//! The query runs on a single-threaded tokio runtime created per call, so
//! the strategy stays synchronous from the harness' point of view.

use std::path::Path;

use arrow_array::cast::AsArray;
use arrow_array::types::{Float64Type, Int64Type, UInt8Type};
use arrow_array::RecordBatch;
use datafusion::prelude::{ParquetReadOptions, SessionContext};

use super::{open_dataset, AggregateRow, AggregationStrategy};
use crate::dataset::DatasetFormat;
use crate::utils::StrategyError;

const TABLE_NAME: &str = "events";

/// `values` is a reserved word, hence the quoting
const AGGREGATE_SQL: &str = "SELECT event_types AS event_type, \
     COUNT(*) AS count, \
     SUM(\"values\") AS sum, \
     AVG(\"values\") AS mean \
     FROM events GROUP BY 1 ORDER BY 1";

#[derive(Debug, Clone, Copy, Default)]
pub struct DataFusionSqlStrategy;

impl DataFusionSqlStrategy {
    async fn query(path: &str, extension: &str) -> datafusion::error::Result<Vec<RecordBatch>> {
        let ctx = SessionContext::new();
        let options = ParquetReadOptions {
            file_extension: extension,
            ..Default::default()
        };
        ctx.register_parquet(TABLE_NAME, path, options).await?;
        ctx.sql(AGGREGATE_SQL).await?.collect().await
    }

    fn rows_from_batches(
        batches: &[RecordBatch],
        path: &Path,
    ) -> Result<Vec<AggregateRow>, StrategyError> {
        let bad_column = |idx: usize| {
            StrategyError::format(
                path,
                DatasetFormat::Parquet,
                format!("unexpected type for result column {}", idx),
            )
        };

        let mut rows = Vec::new();
        for batch in batches {
            let types = batch.column(0).as_primitive_opt::<UInt8Type>().ok_or_else(|| bad_column(0))?;
            let counts = batch.column(1).as_primitive_opt::<Int64Type>().ok_or_else(|| bad_column(1))?;
            let sums = batch.column(2).as_primitive_opt::<Float64Type>().ok_or_else(|| bad_column(2))?;
            let means = batch.column(3).as_primitive_opt::<Float64Type>().ok_or_else(|| bad_column(3))?;

            for i in 0..batch.num_rows() {
                rows.push(AggregateRow {
                    event_type: types.value(i),
                    count: counts.value(i) as u64,
                    sum: sums.value(i),
                    mean: means.value(i),
                });
            }
        }
        Ok(rows)
    }
}

impl AggregationStrategy for DataFusionSqlStrategy {
    fn input_format(&self) -> DatasetFormat {
        DatasetFormat::Parquet
    }

    fn aggregate(&self, path: &Path) -> Result<Vec<AggregateRow>, StrategyError> {
        let format = DatasetFormat::Parquet;
        // Surface a missing file as DatasetNotFound rather than a planner error
        drop(open_dataset(path, format)?);

        let location = path
            .to_str()
            .ok_or_else(|| StrategyError::format(path, format, "path is not valid UTF-8"))?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StrategyError::Runtime(e.to_string()))?;
        let batches = rt
            .block_on(Self::query(location, &extension))
            .map_err(|e| StrategyError::format(path, format, e))?;

        Self::rows_from_batches(&batches, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{encode, generate};
    use crate::strategy::test_support::{assert_reference_rows, write_reference};
    use crate::strategy::ArrowKernelStrategy;
    use tempfile::TempDir;

    #[test]
    fn test_reference_aggregation() {
        let dir = TempDir::new().unwrap();
        let path = write_reference(dir.path(), DatasetFormat::Parquet);
        assert_reference_rows(&DataFusionSqlStrategy.aggregate(&path).unwrap());
    }

    #[test]
    fn test_matches_kernel_strategy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agree.parquet");
        encode(&generate(5, 20_000), DatasetFormat::Parquet, &path).unwrap();

        let sql = DataFusionSqlStrategy.aggregate(&path).unwrap();
        let kernels = ArrowKernelStrategy.aggregate(&path).unwrap();
        assert_eq!(sql.len(), kernels.len());
        for (a, b) in sql.iter().zip(&kernels) {
            assert_eq!(a.event_type, b.event_type);
            assert_eq!(a.count, b.count);
            assert!((a.sum - b.sum).abs() < 1e-6);
            assert!((a.mean - b.mean).abs() < 1e-9);
        }
    }

    #[test]
    fn test_missing_dataset() {
        let dir = TempDir::new().unwrap();
        let err = DataFusionSqlStrategy
            .aggregate(&dir.path().join("absent.parquet"))
            .unwrap_err();
        assert!(matches!(err, StrategyError::DatasetNotFound(_)));
    }

    #[test]
    fn test_csv_input_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_reference(dir.path(), DatasetFormat::Csv);
        assert!(matches!(
            DataFusionSqlStrategy.aggregate(&path),
            Err(StrategyError::DatasetFormat { .. })
        ));
    }
}
