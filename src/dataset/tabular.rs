//! Adapters to standard tabular formats
//!
//! Parquet and Arrow IPC go through an Arrow `RecordBatch`; csv and jsonl
//! serialize row projections with serde. All four use the tabular column
//! names (`user_ids`, `event_types`, `values`, ...) and keep `f64` values
//! exact: Arrow stores raw bits, and the text writers print the shortest
//! representation that parses back to the same bits.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::{Float64Type, UInt16Type, UInt64Type, UInt8Type};
use arrow_array::{
    ArrayRef, ArrowPrimitiveType, Float64Array, PrimitiveArray, RecordBatch, StringArray,
    UInt16Array, UInt64Array, UInt8Array,
};
use arrow_ipc::reader::FileReader;
use arrow_ipc::writer::FileWriter;
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::{EnabledStatistics, WriterProperties};

use super::schema::{
    EventBatch, EventRecord, OwnedTabularRow, TabularRow, COL_EVENT_ID, COL_EVENT_TYPE,
    COL_METADATA, COL_TIMESTAMP, COL_USER_ID, COL_VALUE,
};
use crate::utils::{CorruptDatasetError, EncodingError};

/// Rows per Parquet row group; small enough that mid-sized datasets split
/// into several groups for the parallel strategy
pub const PARQUET_ROW_GROUP_SIZE: usize = 64 * 1024;

/// Arrow schema of the event table
pub fn event_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(COL_EVENT_ID, DataType::UInt64, false),
        Field::new(COL_TIMESTAMP, DataType::UInt64, false),
        Field::new(COL_USER_ID, DataType::UInt16, false),
        Field::new(COL_EVENT_TYPE, DataType::UInt8, false),
        Field::new(COL_VALUE, DataType::Float64, false),
        Field::new(COL_METADATA, DataType::Utf8, false),
    ]))
}

/// Convert a batch to a single Arrow record batch
pub fn to_record_batch(batch: &EventBatch) -> Result<RecordBatch, EncodingError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(batch.event_ids().to_vec())),
        Arc::new(UInt64Array::from(batch.timestamps().to_vec())),
        Arc::new(UInt16Array::from(batch.user_ids().to_vec())),
        Arc::new(UInt8Array::from(batch.event_types().to_vec())),
        Arc::new(Float64Array::from(batch.values().to_vec())),
        Arc::new(StringArray::from_iter_values(batch.metadata().iter())),
    ];
    Ok(RecordBatch::try_new(event_schema(), columns)?)
}

fn primitive_column<'a, T: ArrowPrimitiveType>(
    rb: &'a RecordBatch,
    name: &'static str,
) -> Result<&'a PrimitiveArray<T>, CorruptDatasetError> {
    rb.column_by_name(name)
        .and_then(|col| col.as_primitive_opt::<T>())
        .ok_or(CorruptDatasetError::Column {
            column: name,
            expected: std::any::type_name::<T::Native>(),
        })
}

/// Append the rows of Arrow record batches to an owned batch
fn from_record_batches<I>(batches: I) -> Result<EventBatch, CorruptDatasetError>
where
    I: IntoIterator<Item = Result<RecordBatch, arrow_schema::ArrowError>>,
{
    let mut records = Vec::new();
    for rb in batches {
        let rb = rb?;
        let event_id = primitive_column::<UInt64Type>(&rb, COL_EVENT_ID)?;
        let timestamp = primitive_column::<UInt64Type>(&rb, COL_TIMESTAMP)?;
        let user_id = primitive_column::<UInt16Type>(&rb, COL_USER_ID)?;
        let event_type = primitive_column::<UInt8Type>(&rb, COL_EVENT_TYPE)?;
        let value = primitive_column::<Float64Type>(&rb, COL_VALUE)?;
        let metadata = rb
            .column_by_name(COL_METADATA)
            .and_then(|col| col.as_string_opt::<i32>())
            .ok_or(CorruptDatasetError::Column {
                column: COL_METADATA,
                expected: "utf8",
            })?;

        records.reserve(rb.num_rows());
        for i in 0..rb.num_rows() {
            records.push(EventRecord {
                event_id: event_id.value(i),
                timestamp: timestamp.value(i),
                user_id: user_id.value(i),
                event_type: event_type.value(i),
                value: value.value(i),
                metadata: metadata.value(i).to_string(),
            });
        }
    }
    Ok(records.into_iter().collect())
}

/// Parquet writer properties for event datasets
fn parquet_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_max_row_group_size(PARQUET_ROW_GROUP_SIZE)
        .set_dictionary_enabled(true)
        .set_statistics_enabled(EnabledStatistics::Chunk)
        .build()
}

pub fn write_parquet<W: Write + Send>(batch: &EventBatch, writer: W) -> Result<(), EncodingError> {
    let rb = to_record_batch(batch)?;
    let mut writer = ArrowWriter::try_new(writer, rb.schema(), Some(parquet_properties()))?;
    writer.write(&rb)?;
    writer.close()?;
    Ok(())
}

pub fn read_parquet<P: AsRef<Path>>(path: P) -> Result<EventBatch, CorruptDatasetError> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    from_record_batches(reader)
}

pub fn write_arrow<W: Write>(batch: &EventBatch, writer: W) -> Result<(), EncodingError> {
    let rb = to_record_batch(batch)?;
    let mut writer = FileWriter::try_new(writer, &rb.schema())?;
    writer.write(&rb)?;
    writer.finish()?;
    Ok(())
}

pub fn read_arrow<P: AsRef<Path>>(path: P) -> Result<EventBatch, CorruptDatasetError> {
    let file = File::open(path)?;
    let reader = FileReader::try_new(file, None)?;
    from_record_batches(reader)
}

pub fn write_csv<W: Write>(batch: &EventBatch, writer: W) -> Result<(), EncodingError> {
    let mut writer = csv::Writer::from_writer(writer);
    if batch.is_empty() {
        // serde only emits the header alongside the first record
        writer.write_record(super::schema::COLUMNS)?;
    }
    for event in batch.rows() {
        writer.serialize(TabularRow::from(event))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<EventBatch, CorruptDatasetError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize::<OwnedTabularRow>() {
        records.push(EventRecord::from(row?));
    }
    Ok(records.into_iter().collect())
}

pub fn write_jsonl<W: Write>(batch: &EventBatch, mut writer: W) -> Result<(), EncodingError> {
    for event in batch.rows() {
        serde_json::to_writer(&mut writer, &TabularRow::from(event))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_jsonl<P: AsRef<Path>>(path: P) -> Result<EventBatch, CorruptDatasetError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row: OwnedTabularRow =
            serde_json::from_str(&line).map_err(|source| CorruptDatasetError::Json {
                line: idx as u64 + 1,
                source,
            })?;
        records.push(EventRecord::from(row));
    }
    Ok(records.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::generator::generate;
    use tempfile::TempDir;

    #[test]
    fn test_record_batch_shape() {
        let rb = to_record_batch(&generate(1, 12)).unwrap();
        assert_eq!(rb.num_rows(), 12);
        assert_eq!(rb.num_columns(), 6);
        assert_eq!(rb.schema().field(3).name(), "event_types");
        assert_eq!(rb.schema().field(3).data_type(), &DataType::UInt8);
    }

    #[test]
    fn test_jsonl_native_values() {
        let batch = generate(4, 2);
        let mut out = Vec::new();
        write_jsonl(&batch, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let value: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(value["event_id"], serde_json::json!(1));
        assert!(value["values"].is_f64());
        assert!(value["user_ids"].is_u64());
        assert!(value["metadata"].is_string());
    }

    #[test]
    fn test_csv_header() {
        let mut out = Vec::new();
        write_csv(&generate(1, 1), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("event_id,timestamp,user_ids,event_types,values,metadata\n"));

        let mut empty = Vec::new();
        write_csv(&generate(1, 0), &mut empty).unwrap();
        assert_eq!(
            String::from_utf8(empty).unwrap(),
            "event_id,timestamp,user_ids,event_types,values,metadata\n"
        );
    }

    #[test]
    fn test_text_formats_keep_exact_floats() {
        let dir = TempDir::new().unwrap();
        let batch = generate(21, 300);

        let csv_path = dir.path().join("exact.csv");
        write_csv(&batch, File::create(&csv_path).unwrap()).unwrap();
        assert!(read_csv(&csv_path).unwrap().bit_eq(&batch));

        let jsonl_path = dir.path().join("exact.jsonl");
        write_jsonl(&batch, File::create(&jsonl_path).unwrap()).unwrap();
        assert!(read_jsonl(&jsonl_path).unwrap().bit_eq(&batch));
    }

    #[test]
    fn test_columnar_formats_round_trip() {
        let dir = TempDir::new().unwrap();
        let batch = generate(8, 70_000);

        let pq_path = dir.path().join("rt.parquet");
        write_parquet(&batch, File::create(&pq_path).unwrap()).unwrap();
        assert!(read_parquet(&pq_path).unwrap().bit_eq(&batch));

        let ipc_path = dir.path().join("rt.arrow");
        write_arrow(&batch, File::create(&ipc_path).unwrap()).unwrap();
        assert!(read_arrow(&ipc_path).unwrap().bit_eq(&batch));
    }

    #[test]
    fn test_wrong_column_type() {
        let dir = TempDir::new().unwrap();
        let schema = Arc::new(Schema::new(vec![Field::new(
            COL_EVENT_ID,
            DataType::Utf8,
            false,
        )]));
        let rb = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(StringArray::from(vec!["x"])) as ArrayRef],
        )
        .unwrap();
        let path = dir.path().join("bad.arrow");
        let mut writer = FileWriter::try_new(File::create(&path).unwrap(), &schema).unwrap();
        writer.write(&rb).unwrap();
        writer.finish().unwrap();

        assert!(matches!(
            read_arrow(&path),
            Err(CorruptDatasetError::Column { column: "event_id", .. })
        ));
    }
}
