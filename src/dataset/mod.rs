//! Synthetic event datasets
//!
//! This module owns the fixed event schema, the seeded generator, and the
//! codecs that persist a batch as binary, parquet, arrow, csv or jsonl.
//! The binary format is defined here; the others delegate to their
//! standard writers.

pub mod binary_dataset;
pub mod codec;
pub mod generator;
pub mod header;
pub mod schema;
pub mod tabular;

pub use binary_dataset::{read_binary, write_binary, BinaryDataset};
pub use codec::{decode, encode, generate_and_save};
pub use generator::{generate, DataGenerator};
pub use header::{DatasetHeader, DATASET_MAGIC, HEADER_SIZE};
pub use schema::{DatasetFormat, EventBatch, EventRecord, EventRef, MAX_METADATA_LEN};
