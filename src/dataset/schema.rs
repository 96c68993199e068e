//! Fixed event schema and dataset format identifiers
//!
//! Every component shares this record shape. Batches are columnar in memory
//! (one `Vec` per field) so they convert to Arrow arrays without reshaping,
//! and expose row views for the row-oriented codecs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tabular column names used by the parquet, arrow, csv and jsonl formats
pub const COL_EVENT_ID: &str = "event_id";
pub const COL_TIMESTAMP: &str = "timestamp";
pub const COL_USER_ID: &str = "user_ids";
pub const COL_EVENT_TYPE: &str = "event_types";
pub const COL_VALUE: &str = "values";
pub const COL_METADATA: &str = "metadata";

/// All tabular columns in on-disk order
pub const COLUMNS: [&str; 6] = [
    COL_EVENT_ID,
    COL_TIMESTAMP,
    COL_USER_ID,
    COL_EVENT_TYPE,
    COL_VALUE,
    COL_METADATA,
];

/// Maximum metadata byte length (u16 length prefix in the binary format)
pub const MAX_METADATA_LEN: usize = u16::MAX as usize;

/// Supported on-disk dataset formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    Binary,
    Parquet,
    Arrow,
    Csv,
    Jsonl,
}

impl DatasetFormat {
    pub const ALL: [DatasetFormat; 5] = [
        DatasetFormat::Binary,
        DatasetFormat::Parquet,
        DatasetFormat::Arrow,
        DatasetFormat::Csv,
        DatasetFormat::Jsonl,
    ];

    /// Identifier used on the command line and in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetFormat::Binary => "binary",
            DatasetFormat::Parquet => "parquet",
            DatasetFormat::Arrow => "arrow",
            DatasetFormat::Csv => "csv",
            DatasetFormat::Jsonl => "jsonl",
        }
    }

    /// Canonical file extension (without the dot)
    pub fn extension(&self) -> &'static str {
        match self {
            DatasetFormat::Binary => "bin",
            DatasetFormat::Parquet => "parquet",
            DatasetFormat::Arrow => "arrow",
            DatasetFormat::Csv => "csv",
            DatasetFormat::Jsonl => "jsonl",
        }
    }
}

impl fmt::Display for DatasetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "binary" | "bin" => Ok(DatasetFormat::Binary),
            "parquet" => Ok(DatasetFormat::Parquet),
            "arrow" | "ipc" => Ok(DatasetFormat::Arrow),
            "csv" => Ok(DatasetFormat::Csv),
            "jsonl" => Ok(DatasetFormat::Jsonl),
            other => Err(format!(
                "unsupported format '{}'; expected one of binary, parquet, arrow, csv, jsonl",
                other
            )),
        }
    }
}

/// Borrowed view of one event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventRef<'a> {
    pub event_id: u64,
    pub timestamp: u64,
    pub user_id: u16,
    pub event_type: u8,
    pub value: f64,
    pub metadata: &'a str,
}

/// Owned event, mainly for building batches by hand
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub event_id: u64,
    pub timestamp: u64,
    pub user_id: u16,
    pub event_type: u8,
    pub value: f64,
    pub metadata: String,
}

/// Serde projection of one row with the tabular column names.
///
/// Shared by the csv and jsonl codecs so both agree on field names and
/// emit native numbers rather than wrapped scalars.
#[derive(Debug, Serialize)]
pub(crate) struct TabularRow<'a> {
    pub event_id: u64,
    pub timestamp: u64,
    pub user_ids: u16,
    pub event_types: u8,
    pub values: f64,
    pub metadata: &'a str,
}

/// Owned counterpart of [`TabularRow`] for decoding
#[derive(Debug, Deserialize)]
pub(crate) struct OwnedTabularRow {
    pub event_id: u64,
    pub timestamp: u64,
    pub user_ids: u16,
    pub event_types: u8,
    pub values: f64,
    pub metadata: String,
}

impl<'a> From<EventRef<'a>> for TabularRow<'a> {
    fn from(event: EventRef<'a>) -> Self {
        Self {
            event_id: event.event_id,
            timestamp: event.timestamp,
            user_ids: event.user_id,
            event_types: event.event_type,
            values: event.value,
            metadata: event.metadata,
        }
    }
}

impl From<OwnedTabularRow> for EventRecord {
    fn from(row: OwnedTabularRow) -> Self {
        Self {
            event_id: row.event_id,
            timestamp: row.timestamp,
            user_id: row.user_ids,
            event_type: row.event_types,
            value: row.values,
            metadata: row.metadata,
        }
    }
}

/// Immutable, columnar batch of events
///
/// Fields are private: once built, a batch is only read. Use
/// [`EventBatch::from_iter`] or the generator to construct one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBatch {
    event_id: Vec<u64>,
    timestamp: Vec<u64>,
    user_id: Vec<u16>,
    event_type: Vec<u8>,
    value: Vec<f64>,
    metadata: Vec<String>,
}

impl EventBatch {
    /// Assemble a batch from equal-length columns (crate-internal: callers
    /// guarantee the lengths match)
    pub(crate) fn from_columns(
        event_id: Vec<u64>,
        timestamp: Vec<u64>,
        user_id: Vec<u16>,
        event_type: Vec<u8>,
        value: Vec<f64>,
        metadata: Vec<String>,
    ) -> Self {
        debug_assert!(
            [
                timestamp.len(),
                user_id.len(),
                event_type.len(),
                value.len(),
                metadata.len()
            ]
            .iter()
            .all(|&len| len == event_id.len()),
            "column length mismatch"
        );
        Self {
            event_id,
            timestamp,
            user_id,
            event_type,
            value,
            metadata,
        }
    }

    fn with_capacity(n: usize) -> Self {
        Self {
            event_id: Vec::with_capacity(n),
            timestamp: Vec::with_capacity(n),
            user_id: Vec::with_capacity(n),
            event_type: Vec::with_capacity(n),
            value: Vec::with_capacity(n),
            metadata: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, record: EventRecord) {
        self.event_id.push(record.event_id);
        self.timestamp.push(record.timestamp);
        self.user_id.push(record.user_id);
        self.event_type.push(record.event_type);
        self.value.push(record.value);
        self.metadata.push(record.metadata);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.event_id.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.event_id.is_empty()
    }

    pub fn event_ids(&self) -> &[u64] {
        &self.event_id
    }

    pub fn timestamps(&self) -> &[u64] {
        &self.timestamp
    }

    pub fn user_ids(&self) -> &[u16] {
        &self.user_id
    }

    pub fn event_types(&self) -> &[u8] {
        &self.event_type
    }

    pub fn values(&self) -> &[f64] {
        &self.value
    }

    pub fn metadata(&self) -> &[String] {
        &self.metadata
    }

    /// Row view at index
    ///
    /// # Panics
    /// Panics if `idx >= len()`
    #[inline]
    pub fn row(&self, idx: usize) -> EventRef<'_> {
        EventRef {
            event_id: self.event_id[idx],
            timestamp: self.timestamp[idx],
            user_id: self.user_id[idx],
            event_type: self.event_type[idx],
            value: self.value[idx],
            metadata: &self.metadata[idx],
        }
    }

    /// Iterate rows in order
    pub fn rows(&self) -> impl ExactSizeIterator<Item = EventRef<'_>> + '_ {
        (0..self.len()).map(move |idx| self.row(idx))
    }

    /// Bitwise equality (treats `f64` by bit pattern, so NaN == NaN and
    /// 0.0 != -0.0)
    pub fn bit_eq(&self, other: &EventBatch) -> bool {
        self.event_id == other.event_id
            && self.timestamp == other.timestamp
            && self.user_id == other.user_id
            && self.event_type == other.event_type
            && self.metadata == other.metadata
            && self.value.len() == other.value.len()
            && self
                .value
                .iter()
                .zip(&other.value)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl FromIterator<EventRecord> for EventBatch {
    fn from_iter<I: IntoIterator<Item = EventRecord>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut batch = EventBatch::with_capacity(iter.size_hint().0);
        for record in iter {
            batch.push(record);
        }
        batch
    }
}
