//! Item record and its on-disk encoding
//!
//! ## Record Format
//! ```text
//! ┌─────────────┬────────────────────────────────────────┐
//! │ Schema (1)  │ bincode(Item), fields in declared order │
//! └─────────────┴────────────────────────────────────────┘
//! ```
//! Fields must never be reordered or removed; a new field means a new
//! schema byte.

use serde::{Deserialize, Serialize};

use crate::error::{ItemDbError, Result};

/// Current record schema version
pub const SCHEMA_VERSION: u8 = 1;

/// Canonical catalog record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Upstream identifier (not unique-enforced by the store)
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Category label (`type` upstream)
    pub item_type: String,
    pub icon: String,
    pub icon_large: String,
    pub members: bool,
    pub current_price: i64,
    pub current_trend: String,
    pub today_price_change: i64,
    pub today_trend: String,
}

impl Item {
    /// Storage key: the lowercased name
    pub fn key(&self) -> Vec<u8> {
        normalize_key(&self.name)
    }

    /// Encode with the schema version prefix
    pub fn encode(&self) -> Result<Vec<u8>> {
        let body = bincode::serialize(self)
            .map_err(|e| ItemDbError::Serialization(format!("item {:?}: {}", self.name, e)))?;

        let mut bytes = Vec::with_capacity(1 + body.len());
        bytes.push(SCHEMA_VERSION);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Decode bytes produced by [`Item::encode`]
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (version, body) = bytes
            .split_first()
            .ok_or_else(|| ItemDbError::Deserialization("empty record".to_string()))?;

        if *version != SCHEMA_VERSION {
            return Err(ItemDbError::Deserialization(format!(
                "unknown record schema {}",
                version
            )));
        }

        bincode::deserialize(body).map_err(|e| ItemDbError::Deserialization(e.to_string()))
    }
}

/// Normalize an item name (or search prefix) into key bytes
pub fn normalize_key(name: &str) -> Vec<u8> {
    name.to_lowercase().into_bytes()
}
