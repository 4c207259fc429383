//! Error types for catalog requests and workflow dispatch

use thiserror::Error;

use crate::workflow::StageId;

/// Errors raised by the catalog client and the workflow controller
///
/// Links that do not point at a collection and empty queries are
/// tolerated rather than reported, so they have no variant here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StacError {
    /// Transport, HTTP status or JSON parse failure from the HTTP collaborator
    #[error("Request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    /// Dispatch to a stage that has no registered view
    #[error("Stage {0} does not exist")]
    UnknownStage(StageId),

    /// A timestamp that could not be parsed
    #[error("Invalid time '{0}': expected RFC 3339 (e.g. 2020-01-01T00:00:00Z) or YYYY-MM-DD")]
    InvalidTime(String),
}

impl StacError {
    pub fn request_failed(url: &str, reason: impl std::fmt::Display) -> Self {
        StacError::RequestFailed {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StacError>;
