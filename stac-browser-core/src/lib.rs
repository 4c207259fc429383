//! STAC Browser core library
//!
//! Client model for STAC-compatible APIs (catalogs, collections, paginated
//! item search) and the workflow state machine that sequences browsing:
//! load catalogs, query, load items, show results, select and download.

pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod workflow;

pub use error::{Result, StacError};
