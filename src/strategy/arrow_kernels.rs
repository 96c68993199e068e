//! Vectorized aggregation with Arrow compute kernels
//!
//! For every batch the distinct event types are found first, then each type
//! is aggregated with a comparison mask, a filter and a sum kernel. This is
//! the mask-per-group shape of array programming rather than a hash
//! aggregate.

use std::path::Path;

use arrow::compute::kernels::cmp::eq;
use arrow::compute::{filter, sum};
use arrow_array::cast::AsArray;
use arrow_array::types::{Float64Type, UInt8Type};
use arrow_array::UInt8Array;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;

use super::{open_dataset, primitive_column, AggregateRow, AggregationStrategy, GroupTotals};
use crate::dataset::schema::{COL_EVENT_TYPE, COL_VALUE};
use crate::dataset::DatasetFormat;
use crate::utils::StrategyError;

/// Mask/filter/sum kernels over Parquet record batches
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowKernelStrategy;

impl AggregationStrategy for ArrowKernelStrategy {
    fn input_format(&self) -> DatasetFormat {
        DatasetFormat::Parquet
    }

    fn aggregate(&self, path: &Path) -> Result<Vec<AggregateRow>, StrategyError> {
        let format = DatasetFormat::Parquet;
        let bad = |e: &dyn std::fmt::Display| StrategyError::format(path, format, e);

        let file = open_dataset(path, format)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| bad(&e))?;
        let schema = builder.schema().clone();
        let projection = [COL_EVENT_TYPE, COL_VALUE]
            .iter()
            .map(|name| schema.index_of(name))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| bad(&e))?;
        let mask = ProjectionMask::roots(builder.parquet_schema(), projection);
        let reader = builder.with_projection(mask).build().map_err(|e| bad(&e))?;

        let mut totals = GroupTotals::new();
        for batch in reader {
            let batch = batch.map_err(|e| bad(&e))?;
            let types = primitive_column::<UInt8Type>(&batch, COL_EVENT_TYPE, path, format)?;
            let values = primitive_column::<Float64Type>(&batch, COL_VALUE, path, format)?;

            let mut present = [false; 256];
            for &t in types.values().iter() {
                present[t as usize] = true;
            }

            for t in (0..=u8::MAX).filter(|&t| present[t as usize]) {
                let selector = eq(types, &UInt8Array::new_scalar(t)).map_err(|e| bad(&e))?;
                let count = selector.true_count() as u64;
                if count == 0 {
                    continue;
                }
                let selected = filter(values, &selector).map_err(|e| bad(&e))?;
                let group_sum = sum(selected.as_primitive::<Float64Type>()).unwrap_or(0.0);
                totals.add_group(t, count, group_sum);
            }
        }
        Ok(totals.finish())
    }
}
