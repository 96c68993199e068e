//! Semi-structured JSON Lines aggregation

use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{open_dataset, AggregateRow, AggregationStrategy, EventProjection, GroupTotals};
use crate::dataset::DatasetFormat;
use crate::utils::StrategyError;

/// Parses one JSON object per line; blank lines are skipped
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesStrategy;

impl AggregationStrategy for JsonLinesStrategy {
    fn input_format(&self) -> DatasetFormat {
        DatasetFormat::Jsonl
    }

    fn aggregate(&self, path: &Path) -> Result<Vec<AggregateRow>, StrategyError> {
        let format = DatasetFormat::Jsonl;
        let reader = BufReader::new(open_dataset(path, format)?);

        let mut totals = GroupTotals::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| StrategyError::format(path, format, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let event: EventProjection = serde_json::from_str(&line).map_err(|e| {
                StrategyError::format(path, format, format!("line {}: {}", idx + 1, e))
            })?;
            totals.add(event.event_types, event.values);
        }
        Ok(totals.finish())
    }
}
