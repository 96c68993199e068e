//! Zero-copy scan of the binary row format

use std::path::Path;

use super::{AggregateRow, AggregationStrategy, GroupTotals};
use crate::dataset::{BinaryDataset, DatasetFormat};
use crate::utils::{CorruptDatasetError, StrategyError};

/// Walks rows directly in the memory-mapped file
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryScanStrategy;

impl AggregationStrategy for BinaryScanStrategy {
    fn input_format(&self) -> DatasetFormat {
        DatasetFormat::Binary
    }

    fn aggregate(&self, path: &Path) -> Result<Vec<AggregateRow>, StrategyError> {
        let format = DatasetFormat::Binary;
        let dataset = BinaryDataset::open(path).map_err(|e| match e {
            CorruptDatasetError::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                StrategyError::DatasetNotFound(path.to_path_buf())
            }
            other => StrategyError::format(path, format, other),
        })?;

        let mut totals = GroupTotals::new();
        for event in dataset.rows() {
            let event = event.map_err(|e| StrategyError::format(path, format, e))?;
            totals.add(event.event_type, event.value);
        }
        Ok(totals.finish())
    }
}
