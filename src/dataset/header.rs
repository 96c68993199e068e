//! Binary dataset header and row layout
//!
//! The binary format is a 13 byte header followed by `row_count` packed
//! rows. Every field is written as explicit little-endian bytes; nothing
//! depends on the host struct layout.
//!
//! ```text
//! offset 0   5 bytes  magic "CETL1"
//! offset 5   8 bytes  row_count (u64)
//! row:
//!   +0   u64  event_id
//!   +8   u64  timestamp
//!   +16  u16  user_id
//!   +18  u8   event_type
//!   +19  f64  value
//!   +27  u16  meta_len
//!   +29  meta_len bytes of UTF-8 metadata
//! ```

use crate::utils::CorruptDatasetError;

/// Magic bytes identifying a binary dataset
pub const DATASET_MAGIC: &[u8; 5] = b"CETL1";

/// Header size in bytes (magic + row count)
pub const HEADER_SIZE: usize = DATASET_MAGIC.len() + 8;

/// Byte offsets of the fixed-width fields within a row
pub mod row {
    pub const EVENT_ID: usize = 0;
    pub const TIMESTAMP: usize = 8;
    pub const USER_ID: usize = 16;
    pub const EVENT_TYPE: usize = 18;
    pub const VALUE: usize = 19;
    pub const META_LEN: usize = 27;
    /// Size of the fixed-width prefix; metadata bytes start here
    pub const FIXED_SIZE: usize = 29;
}

/// Parsed binary dataset header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetHeader {
    pub row_count: u64,
}

impl DatasetHeader {
    pub fn new(row_count: u64) -> Self {
        Self { row_count }
    }

    /// Serialize to the on-disk bytes
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..DATASET_MAGIC.len()].copy_from_slice(DATASET_MAGIC);
        out[DATASET_MAGIC.len()..].copy_from_slice(&self.row_count.to_le_bytes());
        out
    }

    /// Parse and validate the header at the start of `bytes`
    ///
    /// Magic is checked first so a short file with the wrong leading bytes
    /// is reported as a bad magic rather than a truncated header.
    pub fn parse(bytes: &[u8]) -> Result<Self, CorruptDatasetError> {
        let magic_len = DATASET_MAGIC.len().min(bytes.len());
        if bytes.len() < DATASET_MAGIC.len() || &bytes[..magic_len] != DATASET_MAGIC {
            return Err(CorruptDatasetError::InvalidMagic {
                expected: DATASET_MAGIC.to_vec(),
                actual: bytes[..magic_len].to_vec(),
            });
        }

        if bytes.len() < HEADER_SIZE {
            return Err(CorruptDatasetError::TruncatedHeader {
                size: bytes.len() as u64,
                minimum: HEADER_SIZE as u64,
            });
        }

        let row_count = read_u64(bytes, DATASET_MAGIC.len());
        Ok(Self { row_count })
    }
}

#[inline(always)]
pub(crate) fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(buf)
}

#[inline(always)]
pub(crate) fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

#[inline(always)]
pub(crate) fn read_f64(bytes: &[u8], offset: usize) -> f64 {
    f64::from_bits(read_u64(bytes, offset))
}
