//! Binary dataset codec
//!
//! Writing streams rows through any `Write`. Reading memory-maps the file
//! read-only and walks rows in place; metadata strings are borrowed straight
//! from the mapping, so a full scan allocates nothing.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use memmap2::Mmap;

use super::header::{read_f64, read_u16, read_u64, row, DatasetHeader, HEADER_SIZE};
use super::schema::{EventBatch, EventRecord, EventRef, MAX_METADATA_LEN};
use crate::utils::{CorruptDatasetError, EncodingError};

/// Encode `batch` in the binary layout
///
/// Each row's metadata length is validated before any byte of that row is
/// written; an oversized string aborts the whole encode.
pub fn write_binary<W: Write>(batch: &EventBatch, writer: &mut W) -> Result<(), EncodingError> {
    writer.write_all(&DatasetHeader::new(batch.len() as u64).to_bytes())?;

    let mut buf = Vec::with_capacity(row::FIXED_SIZE + 64);
    for (idx, event) in batch.rows().enumerate() {
        let meta = event.metadata.as_bytes();
        if meta.len() > MAX_METADATA_LEN {
            return Err(EncodingError::MetadataTooLong {
                row: idx as u64,
                len: meta.len(),
                max: MAX_METADATA_LEN,
            });
        }

        buf.clear();
        buf.extend_from_slice(&event.event_id.to_le_bytes());
        buf.extend_from_slice(&event.timestamp.to_le_bytes());
        buf.extend_from_slice(&event.user_id.to_le_bytes());
        buf.push(event.event_type);
        buf.extend_from_slice(&event.value.to_le_bytes());
        buf.extend_from_slice(&(meta.len() as u16).to_le_bytes());
        buf.extend_from_slice(meta);
        writer.write_all(&buf)?;
    }

    writer.flush()?;
    Ok(())
}

/// Memory-mapped binary dataset
///
/// Header is validated on open; row bounds are validated while iterating,
/// since rows are variable length.
pub struct BinaryDataset {
    /// Memory-mapped file
    mmap: Mmap,
    /// Row count declared in the header
    row_count: u64,
}

impl BinaryDataset {
    /// Open and map a binary dataset file
    ///
    /// # Returns
    /// * `Ok(BinaryDataset)` when the header is well formed
    /// * `Err(CorruptDatasetError)` on I/O failure, bad magic or a short header
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CorruptDatasetError> {
        let file = File::open(path.as_ref())?;
        let len = file.metadata()?.len();

        // Mapping a zero-length file is not portable; short files are
        // rejected from a plain read instead.
        if len < HEADER_SIZE as u64 {
            let bytes = std::fs::read(path.as_ref())?;
            return Err(DatasetHeader::parse(&bytes).err().unwrap_or(
                CorruptDatasetError::TruncatedHeader {
                    size: len,
                    minimum: HEADER_SIZE as u64,
                },
            ));
        }

        // SAFETY: The file is opened read-only and we never write through the
        // mapping. Dataset files are never mutated after creation.
        let mmap = unsafe { Mmap::map(&file) }?;
        let header = DatasetHeader::parse(&mmap)?;

        Ok(Self {
            mmap,
            row_count: header.row_count,
        })
    }

    /// Row count declared in the header
    #[inline(always)]
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Total mapped size in bytes
    pub fn mmap_size(&self) -> usize {
        self.mmap.len()
    }

    /// Iterate rows, borrowing metadata from the mapping
    pub fn rows(&self) -> RowIter<'_> {
        RowIter {
            data: &self.mmap,
            offset: HEADER_SIZE,
            next_row: 0,
            row_count: self.row_count,
            failed: false,
        }
    }

    /// Decode every row into an owned batch
    ///
    /// Fails without returning any rows if the file is truncated or a
    /// metadata payload is not UTF-8.
    pub fn to_batch(&self) -> Result<EventBatch, CorruptDatasetError> {
        // Cap the pre-allocation by what the file could actually hold so a
        // corrupt row count cannot trigger a huge allocation.
        let max_rows = (self.mmap.len() - HEADER_SIZE) / row::FIXED_SIZE;
        let capacity = (self.row_count as usize).min(max_rows);
        let mut records = Vec::with_capacity(capacity);
        for event in self.rows() {
            let event = event?;
            records.push(EventRecord {
                event_id: event.event_id,
                timestamp: event.timestamp,
                user_id: event.user_id,
                event_type: event.event_type,
                value: event.value,
                metadata: event.metadata.to_string(),
            });
        }
        Ok(records.into_iter().collect())
    }

    /// Dataset summary string
    pub fn summary(&self) -> String {
        format!(
            "Binary dataset: {} rows, {} bytes mapped",
            self.row_count,
            self.mmap.len()
        )
    }
}

/// Iterator over the rows of a [`BinaryDataset`]
///
/// Yields an error once and then stops if a row runs past the end of the
/// file or carries invalid UTF-8.
pub struct RowIter<'a> {
    data: &'a [u8],
    offset: usize,
    next_row: u64,
    row_count: u64,
    failed: bool,
}

impl<'a> RowIter<'a> {
    fn truncated(&mut self) -> CorruptDatasetError {
        self.failed = true;
        CorruptDatasetError::Truncated {
            expected: self.row_count,
            read: self.next_row,
        }
    }
}

impl<'a> Iterator for RowIter<'a> {
    type Item = Result<EventRef<'a>, CorruptDatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next_row >= self.row_count {
            return None;
        }

        let data = self.data;
        let start = self.offset;
        let Some(fixed_end) = start.checked_add(row::FIXED_SIZE) else {
            return Some(Err(self.truncated()));
        };
        if fixed_end > data.len() {
            return Some(Err(self.truncated()));
        }

        let fixed = &data[start..fixed_end];
        let meta_len = read_u16(fixed, row::META_LEN) as usize;
        let meta_end = fixed_end + meta_len;
        if meta_end > data.len() {
            return Some(Err(self.truncated()));
        }

        let metadata = match std::str::from_utf8(&data[fixed_end..meta_end]) {
            Ok(s) => s,
            Err(_) => {
                self.failed = true;
                return Some(Err(CorruptDatasetError::InvalidMetadata { row: self.next_row }));
            }
        };

        let event = EventRef {
            event_id: read_u64(fixed, row::EVENT_ID),
            timestamp: read_u64(fixed, row::TIMESTAMP),
            user_id: read_u16(fixed, row::USER_ID),
            event_type: fixed[row::EVENT_TYPE],
            value: read_f64(fixed, row::VALUE),
            metadata,
        };

        self.offset = meta_end;
        self.next_row += 1;
        Some(Ok(event))
    }
}

/// Decode a binary dataset file into a batch
pub fn read_binary<P: AsRef<Path>>(path: P) -> Result<EventBatch, CorruptDatasetError> {
    BinaryDataset::open(path)?.to_batch()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::generator::{generate, DataGenerator};
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, batch: &EventBatch) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        write_binary(batch, &mut file).unwrap();
        path
    }

    #[test]
    fn test_exact_layout() {
        let batch: EventBatch = vec![EventRecord {
            event_id: 1,
            timestamp: 2,
            user_id: 0x0304,
            event_type: 5,
            value: 1.0,
            metadata: "ab".to_string(),
        }]
        .into_iter()
        .collect();

        let mut out = Vec::new();
        write_binary(&batch, &mut out).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"CETL1");
        expected.extend_from_slice(&1u64.to_le_bytes());
        expected.extend_from_slice(&1u64.to_le_bytes());
        expected.extend_from_slice(&2u64.to_le_bytes());
        expected.extend_from_slice(&[0x04, 0x03]);
        expected.push(5);
        expected.extend_from_slice(&1.0f64.to_le_bytes());
        expected.extend_from_slice(&[2, 0]);
        expected.extend_from_slice(b"ab");
        assert_eq!(out, expected);
        assert_eq!(out.len(), HEADER_SIZE + row::FIXED_SIZE + 2);
    }

    #[test]
    fn test_round_trip_sizes() {
        let dir = TempDir::new().unwrap();
        for n in [0usize, 1, 1000, 1001] {
            let batch = generate(42, n);
            let path = write_file(&dir, &format!("rt_{}.bin", n), &batch);
            let decoded = read_binary(&path).unwrap();
            assert!(decoded.bit_eq(&batch), "round trip failed for n={}", n);
        }
    }

    #[test]
    fn test_truncated_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "full.bin", &generate(1, 10));
        let bytes = std::fs::read(&path).unwrap();

        let cut = dir.path().join("cut.bin");
        std::fs::write(&cut, &bytes[..HEADER_SIZE + row::FIXED_SIZE + 5]).unwrap();
        match read_binary(&cut) {
            Err(CorruptDatasetError::Truncated { expected, read }) => {
                assert_eq!(expected, 10);
                assert_eq!(read, 0);
            }
            other => panic!("expected truncation error, got {:?}", other.map(|b| b.len())),
        }

        // Header only, no rows
        std::fs::write(&cut, &bytes[..HEADER_SIZE]).unwrap();
        assert!(matches!(
            read_binary(&cut),
            Err(CorruptDatasetError::Truncated { read: 0, .. })
        ));

        // Last byte missing
        std::fs::write(&cut, &bytes[..bytes.len() - 1]).unwrap();
        assert!(matches!(
            read_binary(&cut),
            Err(CorruptDatasetError::Truncated { read: 9, .. })
        ));
    }

    #[test]
    fn test_flipped_magic() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "magic.bin", &generate(1, 3));
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[0] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();
        assert!(matches!(
            read_binary(&path),
            Err(CorruptDatasetError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_empty_and_short_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(
            BinaryDataset::open(&path),
            Err(CorruptDatasetError::InvalidMagic { .. })
        ));

        std::fs::write(&path, b"CETL1\x01").unwrap();
        assert!(matches!(
            BinaryDataset::open(&path),
            Err(CorruptDatasetError::TruncatedHeader { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_metadata() {
        let mut bytes = Vec::new();
        write_binary(
            &vec![EventRecord {
                event_id: 0,
                timestamp: 0,
                user_id: 100,
                event_type: 0,
                value: 0.5,
                metadata: "ok".to_string(),
            }]
            .into_iter()
            .collect(),
            &mut bytes,
        )
        .unwrap();
        let last = bytes.len() - 1;
        bytes[last] = 0xFF;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("utf8.bin");
        std::fs::write(&path, &bytes).unwrap();
        assert!(matches!(
            read_binary(&path),
            Err(CorruptDatasetError::InvalidMetadata { row: 0 })
        ));
    }

    #[test]
    fn test_oversized_metadata_rejected_before_row_bytes() {
        let batch = DataGenerator::new(1)
            .with_metadata_pool(vec!["x".repeat(MAX_METADATA_LEN + 1)])
            .unwrap()
            .generate(3);
        let mut out = Vec::new();
        let err = write_binary(&batch, &mut out).unwrap_err();
        assert!(err.to_string().contains("metadata too long"));
        assert!(matches!(err, EncodingError::MetadataTooLong { row: 0, .. }));
        // Only the header reached the writer
        assert_eq!(out.len(), HEADER_SIZE);
    }

    #[test]
    fn test_max_metadata_accepted() {
        let batch = DataGenerator::new(1)
            .with_metadata_pool(vec!["é".repeat(MAX_METADATA_LEN / 2)])
            .unwrap()
            .generate(2);
        let mut out = Vec::new();
        write_binary(&batch, &mut out).unwrap();
        assert_eq!(
            out.len(),
            HEADER_SIZE + 2 * (row::FIXED_SIZE + (MAX_METADATA_LEN / 2) * 2)
        );
    }

    #[test]
    fn test_rows_are_borrowed() {
        let dir = TempDir::new().unwrap();
        let batch = generate(9, 50);
        let path = write_file(&dir, "scan.bin", &batch);
        let dataset = BinaryDataset::open(&path).unwrap();
        assert_eq!(dataset.row_count(), 50);
        let sum: f64 = dataset.rows().map(|r| r.unwrap().value).sum();
        let expected: f64 = batch.values().iter().sum();
        assert_eq!(sum.to_bits(), expected.to_bits());
    }
}
