//! SSTable Builder
//!
//! Streams strictly ascending entries into a new table file. The entry
//! count in the header is patched in once the index and footer are down.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{ItemDbError, Result};

use super::{SSTable, ENTRY_HEADER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Offset of the entry-count field inside the header (after magic + version)
const COUNT_FIELD_OFFSET: u64 = 6;

/// Writes one SSTable; call [`add`](Self::add) in key order, then [`finish`](Self::finish)
pub struct SSTableBuilder {
    path: PathBuf,
    out: BufWriter<File>,
    /// File offset where the next entry lands
    offset: u64,
    /// `(key, entry offset)` in ascending key order
    index: Vec<(Vec<u8>, u64)>,
    crc: crc32fast::Hasher,
}

impl SSTableBuilder {
    pub fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        let mut out = BufWriter::new(file);
        out.write_all(MAGIC)?;
        out.write_all(&VERSION.to_le_bytes())?;
        out.write_all(&0u64.to_le_bytes())?;

        Ok(Self {
            path: path.to_path_buf(),
            out,
            offset: HEADER_SIZE,
            index: Vec::new(),
            crc: crc32fast::Hasher::new(),
        })
    }

    /// Append one entry; `key` must sort after every key added so far
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if let Some((last, _)) = self.index.last() {
            if key <= last.as_slice() {
                return Err(ItemDbError::Storage(format!(
                    "key {:?} not after {:?} in {}",
                    String::from_utf8_lossy(key),
                    String::from_utf8_lossy(last),
                    self.path.display()
                )));
            }
        }

        let mut entry_header = [0u8; ENTRY_HEADER_SIZE];
        entry_header[..4].copy_from_slice(&(key.len() as u32).to_le_bytes());
        entry_header[4..].copy_from_slice(&(value.len() as u32).to_le_bytes());

        for chunk in [&entry_header[..], key, value] {
            self.out.write_all(chunk)?;
            self.crc.update(chunk);
        }

        self.index.push((key.to_vec(), self.offset));
        self.offset += (ENTRY_HEADER_SIZE + key.len() + value.len()) as u64;
        Ok(())
    }

    /// Write index and footer, patch the header count and fsync
    pub fn finish(self) -> Result<SSTable> {
        let Self {
            path,
            mut out,
            offset: index_offset,
            index,
            crc,
        } = self;

        for (key, entry_offset) in &index {
            out.write_all(&(key.len() as u32).to_le_bytes())?;
            out.write_all(&entry_offset.to_le_bytes())?;
            out.write_all(key)?;
        }

        out.write_all(&index_offset.to_le_bytes())?;
        out.write_all(&crc.finalize().to_le_bytes())?;
        out.write_all(&[0u8; 4])?;

        let mut file = out
            .into_inner()
            .map_err(|e| ItemDbError::Storage(format!("{}: {}", path.display(), e)))?;

        let entry_count = index.len() as u64;
        file.seek(SeekFrom::Start(COUNT_FIELD_OFFSET))?;
        file.write_all(&entry_count.to_le_bytes())?;
        file.sync_all()?;

        let file_size = file.metadata()?.len();
        let min_key = index.first().map(|(k, _)| k.clone()).unwrap_or_default();
        let max_key = index.last().map(|(k, _)| k.clone()).unwrap_or_default();

        Ok(SSTable {
            path,
            entry_count,
            min_key,
            max_key,
            file_size,
        })
    }
}
