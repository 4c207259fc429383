//! STAC catalog client model
//!
//! # Overview
//!
//! An [`Api`] is one STAC-compatible server. It is either hydrated from a
//! cached JSON blob or loaded lazily over HTTP:
//!
//! ```text
//! {href}/stac                  ← root document, `links` name the collections
//!     │
//!     ├── {href}/collections/a ← one GET per collection link
//!     └── {href}/collections/b
//!
//! {href}/stac/search (POST)    ← paged item search, one request per page
//! ```
//!
//! Items are passed through as opaque JSON values.

mod api;
mod collection;
mod link;
mod search;

pub use api::{collection_id_from_href, load_apis, Api, PageHook};
pub use collection::Collection;
pub use link::Link;
pub use search::{
    ItemSearch, Rectangle, SearchResult, TimePeriod, DEFAULT_LIMIT, STAC_TIME_FORMAT,
};

/// One STAC item, passed through unmodified
pub type Item = serde_json::Value;
