//! One WAL record and its byte encoding.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{ItemDbError, Result};

/// Entry header: LSN (8) + CRC (4) + Len (4) = 16 bytes
pub const HEADER_SIZE: usize = 16;

/// A logged write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Position in the log, starting at 1 after every truncate
    pub lsn: u64,

    /// What to apply on replay
    pub operation: Operation,

    /// Unix millis at append time
    pub timestamp: u64,
}

/// Loggable operations; items are only ever upserted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Upsert a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },
}

impl WalEntry {
    /// Create an entry stamped with the current wall-clock time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Encode as `[lsn][crc][len][payload]`
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)
            .map_err(|e| ItemDbError::Serialization(format!("WAL entry: {}", e)))?;

        let crc = crc32fast::hash(&payload);

        let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
        bytes.extend_from_slice(&self.lsn.to_le_bytes());
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&payload);

        Ok(bytes)
    }

    /// Decode one complete entry, verifying its checksum
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let (lsn, crc, len) = Self::parse_header(bytes)?;

        let payload = bytes
            .get(HEADER_SIZE..HEADER_SIZE + len)
            .ok_or_else(|| {
                ItemDbError::WalCorruption(format!(
                    "truncated entry: expected {} payload bytes, got {}",
                    len,
                    bytes.len().saturating_sub(HEADER_SIZE)
                ))
            })?;

        Self::decode_payload(lsn, crc, payload)
    }

    /// Split a header into (lsn, crc, payload_len)
    pub(crate) fn parse_header(bytes: &[u8]) -> Result<(u64, u32, usize)> {
        if bytes.len() < HEADER_SIZE {
            return Err(ItemDbError::WalCorruption(format!(
                "incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut lsn = [0u8; 8];
        let mut crc = [0u8; 4];
        let mut len = [0u8; 4];
        lsn.copy_from_slice(&bytes[0..8]);
        crc.copy_from_slice(&bytes[8..12]);
        len.copy_from_slice(&bytes[12..16]);

        Ok((
            u64::from_le_bytes(lsn),
            u32::from_le_bytes(crc),
            u32::from_le_bytes(len) as usize,
        ))
    }

    /// Check the payload CRC and decode it
    pub(crate) fn decode_payload(lsn: u64, crc: u32, payload: &[u8]) -> Result<Self> {
        let actual = crc32fast::hash(payload);
        if actual != crc {
            return Err(ItemDbError::WalCorruption(format!(
                "CRC mismatch at lsn {}: stored {:#010x}, computed {:#010x}",
                lsn, crc, actual
            )));
        }

        let entry: WalEntry = bincode::deserialize(payload)
            .map_err(|e| ItemDbError::WalCorruption(format!("undecodable entry: {}", e)))?;

        if entry.lsn != lsn {
            return Err(ItemDbError::WalCorruption(format!(
                "header lsn {} does not match payload lsn {}",
                lsn, entry.lsn
            )));
        }

        Ok(entry)
    }
}
