use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::stage::{ApiCollections, ItemLoadingPayload};
use crate::catalog::{Api, Item, Rectangle, TimePeriod};
use crate::config::BrowserConfig;

/// All events the workflow controller accepts
///
/// Completion events carry the epoch of the command that started the
/// work; the controller drops them once that epoch has passed.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// Show the current stage (start-up or re-activation)
    Open,

    // Catalog loading
    CollectionsLoaded {
        epoch: u64,
        apis: Vec<Api>,
    },

    // Query
    Search {
        api_collections: Vec<ApiCollections>,
        extent: Option<Rectangle>,
        time_period: TimePeriod,
    },

    // Item loading
    SearchProgress {
        epoch: u64,
        api_href: String,
        page: u32,
    },
    ItemsLoaded {
        epoch: u64,
        items: Vec<Item>,
    },
    ItemsFailed {
        epoch: u64,
        error: String,
    },

    // Results
    Back,
    SelectDownloads {
        items: Vec<Item>,
        directory: PathBuf,
    },
    Download {
        items: Vec<Item>,
        directory: PathBuf,
    },

    Close,
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::Open => "open",
            WorkflowEvent::CollectionsLoaded { .. } => "collections_loaded",
            WorkflowEvent::Search { .. } => "search",
            WorkflowEvent::SearchProgress { .. } => "search_progress",
            WorkflowEvent::ItemsLoaded { .. } => "items_loaded",
            WorkflowEvent::ItemsFailed { .. } => "items_failed",
            WorkflowEvent::Back => "back",
            WorkflowEvent::SelectDownloads { .. } => "select_downloads",
            WorkflowEvent::Download { .. } => "download",
            WorkflowEvent::Close => "close",
        }
    }
}

/// Side effects requested by the controller
#[derive(Debug, Clone)]
pub enum Command {
    /// Load every configured API, then report `CollectionsLoaded`
    LoadCollections { epoch: u64, api_hrefs: Vec<String> },

    /// Run the query, then report `ItemsLoaded` or `ItemsFailed`
    SearchItems {
        epoch: u64,
        request: ItemLoadingPayload,
        limit: u32,
    },

    /// Hand items to the download subsystem
    Download(DownloadRequest),

    /// Write updated settings
    PersistConfig(BrowserConfig),
}

/// Items and target directory passed to the download subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub download_items: Vec<Item>,
    pub download_directory: PathBuf,
}
