//! SSTable Reader
//!
//! Validates a table at open and keeps its whole index in a `BTreeMap`, so
//! point reads and prefix scans cost one index lookup plus one seek per
//! returned value.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Bound;
use std::path::Path;

use crate::error::{ItemDbError, Result};

use super::{
    entry_lengths, le_u16, le_u32, le_u64, ENTRY_HEADER_SIZE, FOOTER_SIZE, HEADER_SIZE, MAGIC,
    VERSION,
};

/// Bytes in front of each key in the index block: key_len u32 + offset u64
const INDEX_ENTRY_HEADER: usize = 4 + 8;

/// Read handle on one validated table
pub struct SSTableReader {
    file: BufReader<File>,
    /// key → offset of its data entry
    index: BTreeMap<Vec<u8>, u64>,
}

impl SSTableReader {
    /// Open and validate `path`
    ///
    /// Any structural problem (short file, bad magic or version, footer out
    /// of range, data checksum mismatch, index/header count disagreement) is
    /// reported as `ItemDbError::Storage`.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();
        if file_len < HEADER_SIZE + FOOTER_SIZE {
            return Err(corrupt(path, format!("only {} bytes", file_len)));
        }

        let declared_count = read_header(&mut file, path)?;
        let (data_end, data_crc) = read_footer(&mut file, path, file_len)?;

        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        let mut data = vec![0u8; (data_end - HEADER_SIZE) as usize];
        file.read_exact(&mut data)?;
        let computed = crc32fast::hash(&data);
        if computed != data_crc {
            return Err(corrupt(
                path,
                format!("data checksum {:#010x}, footer says {:#010x}", computed, data_crc),
            ));
        }
        drop(data);

        let mut index_block = vec![0u8; (file_len - FOOTER_SIZE - data_end) as usize];
        file.read_exact(&mut index_block)?;
        let index = parse_index(&index_block, path)?;

        if index.len() as u64 != declared_count {
            return Err(corrupt(
                path,
                format!("{} index keys, header says {}", index.len(), declared_count),
            ));
        }

        Ok(Self {
            file: BufReader::new(file),
            index,
        })
    }

    /// Value stored under `key`, `None` if this table does not have it
    pub fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.index.get(key).copied() {
            Some(offset) => self.value_at(offset).map(Some),
            None => Ok(None),
        }
    }

    /// Entries whose key starts with `prefix`, in key order, at most `limit`
    pub fn scan_prefix(&mut self, prefix: &[u8], limit: usize) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let hits: Vec<(Vec<u8>, u64)> = self
            .index
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .take(limit)
            .map(|(key, &offset)| (key.clone(), offset))
            .collect();

        hits.into_iter()
            .map(|(key, offset)| Ok((key, self.value_at(offset)?)))
            .collect()
    }

    fn value_at(&mut self, offset: u64) -> Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(offset))?;

        let mut entry_header = [0u8; ENTRY_HEADER_SIZE];
        self.file.read_exact(&mut entry_header)?;
        let (key_len, value_len) = entry_lengths(&entry_header);

        self.file.seek_relative(key_len as i64)?;
        let mut value = vec![0u8; value_len];
        self.file.read_exact(&mut value)?;
        Ok(value)
    }

    pub fn entry_count(&self) -> u64 {
        self.index.len() as u64
    }

    pub fn min_key(&self) -> Option<&[u8]> {
        self.index.keys().next().map(Vec::as_slice)
    }

    pub fn max_key(&self) -> Option<&[u8]> {
        self.index.keys().next_back().map(Vec::as_slice)
    }

    /// False only when `key` is outside the table's key range
    pub fn might_contain(&self, key: &[u8]) -> bool {
        match (self.min_key(), self.max_key()) {
            (Some(min), Some(max)) => min <= key && key <= max,
            _ => false,
        }
    }

    /// False only when no key starting with `prefix` can be in the table
    ///
    /// Every such key is `>= prefix`, and a first key that is greater than
    /// `prefix` without extending it sorts after all of them.
    pub fn might_contain_prefix(&self, prefix: &[u8]) -> bool {
        match (self.min_key(), self.max_key()) {
            (Some(min), Some(max)) => max >= prefix && (min <= prefix || min.starts_with(prefix)),
            _ => false,
        }
    }
}

/// Check magic and version, return the declared entry count
fn read_header(file: &mut File, path: &Path) -> Result<u64> {
    let mut header = [0u8; HEADER_SIZE as usize];
    file.read_exact(&mut header)?;

    if &header[..4] != MAGIC {
        return Err(corrupt(path, format!("bad magic {:?}", &header[..4])));
    }
    let version = le_u16(&header[4..6]);
    if version != VERSION {
        return Err(corrupt(path, format!("unknown version {}", version)));
    }
    Ok(le_u64(&header[6..]))
}

/// Return `(index offset, data crc)` after bounds-checking the offset
fn read_footer(file: &mut File, path: &Path, file_len: u64) -> Result<(u64, u32)> {
    let footer_start = file_len - FOOTER_SIZE;
    file.seek(SeekFrom::Start(footer_start))?;

    let mut footer = [0u8; FOOTER_SIZE as usize];
    file.read_exact(&mut footer)?;

    let index_offset = le_u64(&footer[..8]);
    if !(HEADER_SIZE..=footer_start).contains(&index_offset) {
        return Err(corrupt(path, format!("index offset {} out of range", index_offset)));
    }
    Ok((index_offset, le_u32(&footer[8..12])))
}

fn parse_index(block: &[u8], path: &Path) -> Result<BTreeMap<Vec<u8>, u64>> {
    let mut index = BTreeMap::new();
    let mut rest = block;

    while !rest.is_empty() {
        if rest.len() < INDEX_ENTRY_HEADER {
            return Err(corrupt(path, "index entry cut short".to_string()));
        }
        let key_len = le_u32(&rest[..4]) as usize;
        let offset = le_u64(&rest[4..12]);
        rest = &rest[INDEX_ENTRY_HEADER..];

        if rest.len() < key_len {
            return Err(corrupt(path, "index key cut short".to_string()));
        }
        index.insert(rest[..key_len].to_vec(), offset);
        rest = &rest[key_len..];
    }
    Ok(index)
}

fn corrupt(path: &Path, reason: String) -> ItemDbError {
    ItemDbError::Storage(format!("corrupt SSTable {}: {}", path.display(), reason))
}
