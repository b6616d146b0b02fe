//! Payload → Item transformation
//!
//! Pure: no I/O. Only a malformed envelope is an error; odd field encodings
//! degrade to defaults and are reported.

use crate::error::{ItemDbError, Result};
use crate::item::Item;

use super::payload::{CatalogueResponse, PriceBlock};
use super::price::normalize_price;

/// Which price fields fell back to zero during a transform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformReport {
    pub current_price_fallback: bool,
    pub today_price_fallback: bool,
}

impl TransformReport {
    /// Number of fields that fell back
    pub fn fallbacks(&self) -> u64 {
        u64::from(self.current_price_fallback) + u64::from(self.today_price_fallback)
    }
}

/// Decode a `detail.json` body into an [`Item`]
pub fn transform(raw: &[u8]) -> Result<Item> {
    transform_with_report(raw).map(|(item, _)| item)
}

/// Like [`transform`], also returning which prices fell back to zero
pub fn transform_with_report(raw: &[u8]) -> Result<(Item, TransformReport)> {
    let response: CatalogueResponse =
        serde_json::from_slice(raw).map_err(|e| ItemDbError::Parse(e.to_string()))?;
    let item = response.item;

    let (current_price, current_price_fallback) = price_or_zero(item.id, "current", &item.current);
    let (today_price_change, today_price_fallback) = price_or_zero(item.id, "today", &item.today);

    let members = item.is_members();

    let record = Item {
        id: item.id,
        name: item.name,
        description: item.description,
        item_type: item.item_type,
        icon: item.icon,
        icon_large: item.icon_large,
        members,
        current_price,
        current_trend: item.current.trend,
        today_price_change,
        today_trend: item.today.trend,
    };

    Ok((
        record,
        TransformReport {
            current_price_fallback,
            today_price_fallback,
        },
    ))
}

fn price_or_zero(id: i64, field: &'static str, block: &PriceBlock) -> (i64, bool) {
    match block.price.as_ref().and_then(normalize_price) {
        Some(price) => (price, false),
        None => {
            tracing::warn!(id, field, raw = ?block.price, "unrecognized price, using 0");
            (0, true)
        }
    }
}
