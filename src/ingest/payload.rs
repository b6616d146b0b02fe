//! Upstream wire types
//!
//! Shape of `detail.json`:
//! `{ "item": { id, name, description, type, icon, icon_large, members,
//!   current: { trend, price }, today: { trend, price } } }`

use serde::Deserialize;
use serde_json::Value;

/// Response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogueResponse {
    pub item: CatalogueItem,
}

/// One catalogue entry; absent fields take their zero value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogueItem {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub icon: String,
    pub icon_large: String,
    /// Upstream sends the strings "true"/"false"; anything goes here
    pub members: Value,
    pub current: PriceBlock,
    pub today: PriceBlock,
}

impl CatalogueItem {
    /// Only the exact string "true" counts as a members item
    pub fn is_members(&self) -> bool {
        matches!(&self.members, Value::String(s) if s == "true")
    }
}

/// A `{ trend, price }` pair
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PriceBlock {
    pub trend: String,
    pub price: Option<RawPrice>,
}

/// A price as it appears on the wire
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    /// Plain JSON number, e.g. `1234`
    Numeric(f64),
    /// Humanized string, e.g. `"75.8k"`, `"+5,000"`, `"- 12"`
    Text(String),
    /// Anything else (bool, array, object)
    Other(Value),
}
