//! Columnar scan of an Arrow IPC file

use std::path::Path;

use arrow_array::types::{Float64Type, UInt8Type};
use arrow_ipc::reader::FileReader;

use super::{open_dataset, primitive_column, AggregateRow, AggregationStrategy, GroupTotals};
use crate::dataset::schema::{COL_EVENT_TYPE, COL_VALUE};
use crate::dataset::DatasetFormat;
use crate::utils::StrategyError;

/// Walks the `event_types` and `values` buffers of each IPC batch in
/// lockstep, touching no other column
#[derive(Debug, Clone, Copy, Default)]
pub struct IpcColumnarStrategy;

impl AggregationStrategy for IpcColumnarStrategy {
    fn input_format(&self) -> DatasetFormat {
        DatasetFormat::Arrow
    }

    fn aggregate(&self, path: &Path) -> Result<Vec<AggregateRow>, StrategyError> {
        let format = DatasetFormat::Arrow;
        let file = open_dataset(path, format)?;
        let reader = FileReader::try_new(file, None)
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
        Ok(totals.finish())
    }
}
