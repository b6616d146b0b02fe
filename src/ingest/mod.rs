//! Ingestion Module
//!
//! Fetches catalogue entries from the upstream pricing API under a global
//! rate limit and turns them into canonical [`Item`](crate::item::Item)s.
//!
//! ## Pipeline
//! ```text
//!  fetch_item(id)
//!      │
//!      ▼
//!  RateLimiter::admit()   (one admission per interval, shared by all callers)
//!      │
//!      ▼
//!  HTTP GET {endpoint}    (fixed timeout, fixed User-Agent)
//!      │
//!      ▼
//!  transform(body)        (pure: JSON envelope → Item, tolerant price parsing)
//! ```
//!
//! Persisting the resulting item is the caller's job.

mod payload;
mod price;
mod transform;
mod limiter;
mod service;

pub use payload::{CatalogueItem, CatalogueResponse, PriceBlock, RawPrice};
pub use price::{normalize_price, parse_price};
pub use transform::{transform, transform_with_report, TransformReport};
pub use limiter::RateLimiter;
pub use service::IngestService;
