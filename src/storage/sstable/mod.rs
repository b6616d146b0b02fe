//! SSTables
//!
//! An SSTable is written once by a memtable flush and only read afterwards.
//! Keys are unique and strictly ascending. All integers are little-endian.
//!
//! ```text
//! offset 0        "RSDB" | version u16 | entry count u64
//! offset 14       data:   { key_len u32 | val_len u32 | key | value } *
//! index_offset    index:  { key_len u32 | entry offset u64 | key } *
//! len - 16        footer: index_offset u64 | crc32(data) u32 | 0u32
//! ```
//!
//! The reader checks magic, version, the data checksum and the index size
//! before it serves anything, so a damaged table fails at open.

mod builder;
mod reader;

use std::path::PathBuf;

pub use builder::SSTableBuilder;
pub use reader::SSTableReader;

pub(crate) const MAGIC: &[u8; 4] = b"RSDB";
pub(crate) const VERSION: u16 = 1;

/// magic + version + entry count
pub(crate) const HEADER_SIZE: u64 = 4 + 2 + 8;

/// index offset + data crc + padding
pub(crate) const FOOTER_SIZE: u64 = 8 + 4 + 4;

/// key_len + val_len in front of every data entry
pub(crate) const ENTRY_HEADER_SIZE: usize = 4 + 4;

pub(crate) fn le_u16(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

pub(crate) fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

pub(crate) fn le_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

/// `(key_len, value_len)` from a data entry header
pub(crate) fn entry_lengths(header: &[u8; ENTRY_HEADER_SIZE]) -> (usize, usize) {
    (le_u32(&header[..4]) as usize, le_u32(&header[4..]) as usize)
}

/// Summary of a table produced by [`SSTableBuilder::finish`]
#[derive(Debug, Clone)]
pub struct SSTable {
    pub path: PathBuf,
    pub entry_count: u64,
    /// First key, empty for a table with no entries
    pub min_key: Vec<u8>,
    /// Last key, empty for a table with no entries
    pub max_key: Vec<u8>,
    pub file_size: u64,
}

impl SSTable {
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }
}
