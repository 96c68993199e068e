//! Out-of-core CSV aggregation
//!
//! Rows are pulled in fixed-size chunks; each chunk is reduced to partial
//! totals which are merged into the running result. Peak memory is bounded
//! by the chunk size, not the file size.

use std::io::BufReader;
use std::path::Path;

use tracing::trace;

use super::{
    open_dataset, require_csv_columns, AggregateRow, AggregationStrategy, EventProjection,
    GroupTotals,
};
use crate::dataset::DatasetFormat;
use crate::utils::StrategyError;

/// Rows buffered per chunk
pub const CHUNK_ROWS: usize = 200_000;

#[derive(Debug, Clone, Copy)]
pub struct StreamingCsvStrategy {
    chunk_rows: usize,
}

impl Default for StreamingCsvStrategy {
    fn default() -> Self {
        Self {
            chunk_rows: CHUNK_ROWS,
        }
    }
}

impl StreamingCsvStrategy {
    /// Strategy with a custom chunk size (clamped to at least one row)
    pub fn with_chunk_rows(chunk_rows: usize) -> Self {
        Self {
            chunk_rows: chunk_rows.max(1),
        }
    }

    pub fn chunk_rows(&self) -> usize {
        self.chunk_rows
    }
}

impl AggregationStrategy for StreamingCsvStrategy {
    fn input_format(&self) -> DatasetFormat {
        DatasetFormat::Csv
    }

    fn aggregate(&self, path: &Path) -> Result<Vec<AggregateRow>, StrategyError> {
        let format = DatasetFormat::Csv;
        let mut reader = csv::Reader::from_reader(BufReader::new(open_dataset(path, format)?));
        let headers = reader
            .headers()
            .map_err(|e| StrategyError::format(path, format, e))?
            .clone();
        require_csv_columns(&headers, path)?;

        let mut records = reader.deserialize::<EventProjection>();
        let mut chunk = Vec::with_capacity(self.chunk_rows.min(CHUNK_ROWS));
        let mut totals = GroupTotals::new();
        let mut row = 0usize;
        let mut chunks = 0usize;

        loop {
            chunk.clear();
            for record in records.by_ref().take(self.chunk_rows) {
                let event = record.map_err(|e| {
                    StrategyError::format(path, format, format!("row {}: {}", row, e))
                })?;
                chunk.push(event);
                row += 1;
            }
            if chunk.is_empty() {
                break;
            }

            let mut partial = GroupTotals::new();
            for event in &chunk {
                partial.add(event.event_types, event.values);
            }
            totals.merge(&partial);
            chunks += 1;
        }

        trace!(chunks, rows = row, "streamed csv");
        Ok(totals.finish())
    }
}
