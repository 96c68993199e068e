//! Row-at-a-time CSV aggregation

use std::io::BufReader;
use std::path::Path;

use super::{open_dataset, require_csv_columns, AggregateRow, AggregationStrategy, EventProjection, GroupTotals};
use crate::dataset::DatasetFormat;
use crate::utils::StrategyError;

/// Parses each CSV record and folds it into per-type totals
#[derive(Debug, Clone, Copy, Default)]
pub struct RowCsvStrategy;

impl AggregationStrategy for RowCsvStrategy {
    fn input_format(&self) -> DatasetFormat {
        DatasetFormat::Csv
    }

    fn aggregate(&self, path: &Path) -> Result<Vec<AggregateRow>, StrategyError> {
        let file = open_dataset(path, DatasetFormat::Csv)?;
        let mut reader = csv::Reader::from_reader(BufReader::new(file));
        let headers = reader
            .headers()
            .map_err(|e| StrategyError::format(path, DatasetFormat::Csv, e))?
            .clone();
        require_csv_columns(&headers, path)?;

        let mut totals = GroupTotals::new();
        for (idx, record) in reader.deserialize::<EventProjection>().enumerate() {
            let event = record.map_err(|e| {
                StrategyError::format(path, DatasetFormat::Csv, format!("row {}: {}", idx, e))
            })?;
            totals.add(event.event_types, event.values);
        }
        Ok(totals.finish())
    }
}
