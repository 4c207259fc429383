//! HTTP collaborator used by the catalog client
//!
//! The catalog only ever needs "fetch this URL as JSON" (GET) or "post
//! this JSON and give me JSON back" (POST), so the seam is a single
//! method. Retries and timeouts are the implementation's concern.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Trait for the transport that talks to STAC APIs
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET `url` when `body` is `None`, otherwise POST `body` as JSON.
    ///
    /// Any failure (network, non-2xx status, malformed JSON) is reported
    /// as [`StacError::RequestFailed`](crate::StacError::RequestFailed).
    async fn request(&self, url: &str, body: Option<&Value>) -> Result<Value>;
}

#[cfg(feature = "http")]
pub use reqwest_client::ReqwestClient;

#[cfg(feature = "http")]
mod reqwest_client {
    use async_trait::async_trait;
    use serde_json::Value;
    use std::time::Duration;
    use tracing::{debug, warn};

    use super::HttpClient;
    use crate::error::{Result, StacError};

    /// reqwest-backed [`HttpClient`]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a client with the given timeout
        pub fn new(timeout_seconds: u64) -> anyhow::Result<Self> {
            use anyhow::Context;

            let client = reqwest::Client::builder()
                .user_agent(concat!("stac-browser/", env!("CARGO_PKG_VERSION")))
                .timeout(Duration::from_secs(timeout_seconds))
                .build()
                .context("Failed to create HTTP client")?;

            Ok(Self { client })
        }
    }

    #[async_trait]
    impl HttpClient for ReqwestClient {
        async fn request(&self, url: &str, body: Option<&Value>) -> Result<Value> {
            let builder = match body {
                Some(body) => {
                    debug!("POST {}", url);
                    self.client.post(url).json(body)
                }
                None => {
                    debug!("GET {}", url);
                    self.client.get(url)
                }
            };

            let response = builder
                .send()
                .await
                .map_err(|e| StacError::request_failed(url, e))?;

            if !response.status().is_success() {
                let status = response.status();
                warn!("STAC API error: {} from {}", status, url);
                return Err(StacError::request_failed(url, format!("HTTP {status}")));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| StacError::request_failed(url, format!("invalid JSON: {e}")))
        }
    }
}
