//! Sequential WAL reader.
//!
//! A short header or a payload running past EOF is a torn append and reads
//! as end-of-log; a checksum or LSN mismatch is an error.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::Result;
use super::entry::HEADER_SIZE;
use super::WalEntry;

/// Forward-only cursor over a log file
///
/// A torn tail (incomplete header or payload at end of file) reads as EOF.
/// A complete entry whose checksum does not match is an error.
pub struct WalReader {
    reader: BufReader<File>,
    /// Offset just past the last entry returned
    position: u64,
    file_len: u64,
}

impl WalReader {
    /// Open `path` positioned at the first record
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            file_len,
        })
    }

    /// Next intact record, `Ok(None)` at end-of-log or a torn tail
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        let remaining = self.file_len.saturating_sub(self.position);
        if remaining < HEADER_SIZE as u64 {
            return Ok(None);
        }

        let mut header = [0u8; HEADER_SIZE];
        self.reader.read_exact(&mut header)?;
        let (lsn, crc, len) = WalEntry::parse_header(&header)?;

        if (len as u64) > remaining - HEADER_SIZE as u64 {
            // Payload was cut short by a crash mid-append
            return Ok(None);
        }

        let mut payload = vec![0u8; len];
        self.reader.read_exact(&mut payload)?;

        let entry = WalEntry::decode_payload(lsn, crc, &payload)?;
        self.position += (HEADER_SIZE + len) as u64;

        Ok(Some(entry))
    }

    /// Offset just past the last successfully read entry
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total length of the file when it was opened
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Consume the reader as an iterator
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }
}

/// Yields records until end-of-log; ends after reporting one error
///
/// Yields at most one error, then stops.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
