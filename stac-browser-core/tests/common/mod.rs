//! Shared fakes for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use stac_browser_core::catalog::Item;
use stac_browser_core::http::HttpClient;
use stac_browser_core::workflow::{
    DownloadHandler, DownloadRequest, StageId, StagePayload, StageView, ViewFactory,
};
use stac_browser_core::{Result, StacError};

pub const API_HREF: &str = "https://stac.example.com";

/// Serves canned documents and search pages, recording every request
#[derive(Default)]
pub struct FakeClient {
    documents: HashMap<String, Value>,
    search_pages: Mutex<HashMap<String, VecDeque<Value>>>,
    failures: HashSet<String>,
    requests: Mutex<Vec<(String, Option<Value>)>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: &str, document: Value) -> Self {
        self.documents.insert(url.to_string(), document);
        self
    }

    /// Queue search pages of the given sizes for `url`
    ///
    /// Item ids run on across pages (`item-0`, `item-1`, ...).
    pub fn with_search_pages(self, url: &str, sizes: &[usize]) -> Self {
        let mut next_id = 0;
        let pages = sizes
            .iter()
            .map(|size| {
                let features: Vec<Value> = (0..*size)
                    .map(|_| {
                        let item = json!({ "type": "Feature", "id": format!("item-{next_id}") });
                        next_id += 1;
                        item
                    })
                    .collect();
                json!({ "type": "FeatureCollection", "features": features })
            })
            .collect();

        self.search_pages
            .lock()
            .unwrap()
            .insert(url.to_string(), pages);
        self
    }

    pub fn with_failure(mut self, url: &str) -> Self {
        self.failures.insert(url.to_string());
        self
    }

    /// A catalog whose root links to `collection_ids` (in order)
    pub fn with_catalog(self, href: &str, title: &str, collection_ids: &[&str]) -> Self {
        let mut links = vec![json!({ "rel": "self", "href": format!("{href}/stac") })];
        links.extend(collection_ids.iter().map(|id| {
            json!({ "rel": "child", "href": format!("{href}/collections/{id}") })
        }));
        links.push(json!({ "rel": "search", "href": format!("{href}/stac/search") }));

        let mut client = self.with_document(
            &format!("{href}/stac"),
            json!({ "title": title, "links": links }),
        );
        for id in collection_ids {
            client = client.with_document(
                &format!("{href}/collections/{id}"),
                json!({ "id": id, "title": id.to_uppercase() }),
            );
        }
        client
    }

    pub fn requests(&self) -> Vec<(String, Option<Value>)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|(url, _)| url).collect()
    }
}

#[async_trait]
impl HttpClient for FakeClient {
    async fn request(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), body.cloned()));

        if self.failures.contains(url) {
            return Err(StacError::request_failed(url, "HTTP 500 Internal Server Error"));
        }

        if body.is_some() {
            let page = self
                .search_pages
                .lock()
                .unwrap()
                .get_mut(url)
                .and_then(VecDeque::pop_front);
            return Ok(page.unwrap_or_else(|| json!({ "type": "FeatureCollection", "features": [] })));
        }

        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| StacError::request_failed(url, "HTTP 404 Not Found"))
    }
}

/// Shared log of view calls, e.g. `"create QUERY"`, `"close QUERY"`
#[derive(Debug, Clone, Default)]
pub struct ViewLog(Arc<Mutex<Vec<String>>>);

impl ViewLog {
    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| e.as_str() == entry).count()
    }

    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.entries().iter().any(|e| e.starts_with(prefix))
    }
}

struct RecordingView {
    stage: StageId,
    log: ViewLog,
}

impl StageView for RecordingView {
    fn show(&mut self) {
        self.log.push(format!("show {}", self.stage));
    }

    fn raise(&mut self) {
        self.log.push(format!("raise {}", self.stage));
    }

    fn close(&mut self) {
        self.log.push(format!("close {}", self.stage));
    }

    fn progress(&mut self, message: &str) {
        self.log.push(format!("progress {}: {}", self.stage, message));
    }
}

/// View factory that records every call
pub struct RecordingViews {
    log: ViewLog,
    unsupported: Vec<StageId>,
    /// Keep the first N items on download selection; `None` cancels
    selection: Option<usize>,
}

impl RecordingViews {
    pub fn new(log: ViewLog) -> Self {
        Self {
            log,
            unsupported: Vec::new(),
            selection: None,
        }
    }

    pub fn without(mut self, stage: StageId) -> Self {
        self.unsupported.push(stage);
        self
    }

    pub fn selecting(mut self, count: usize) -> Self {
        self.selection = Some(count);
        self
    }
}

impl ViewFactory for RecordingViews {
    fn supports(&self, stage: StageId) -> bool {
        !stage.is_transient() && !self.unsupported.contains(&stage)
    }

    fn create(&mut self, stage: StageId, payload: Option<&StagePayload>) -> Box<dyn StageView> {
        if let Some(payload) = payload {
            assert_eq!(payload.stage(), stage, "view built with another stage's payload");
        }
        self.log.push(format!("create {stage}"));
        Box::new(RecordingView {
            stage,
            log: self.log.clone(),
        })
    }

    fn select_downloads(&mut self, items: &[Item]) -> Option<Vec<Item>> {
        self.selection
            .map(|count| items.iter().take(count).cloned().collect())
    }
}

/// Download handler that keeps every request
#[derive(Clone, Default)]
pub struct RecordingDownloads(Arc<Mutex<Vec<DownloadRequest>>>);

impl RecordingDownloads {
    pub fn requests(&self) -> Vec<DownloadRequest> {
        self.0.lock().unwrap().clone()
    }
}

impl DownloadHandler for RecordingDownloads {
    fn start(&self, request: DownloadRequest) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(request);
        Ok(())
    }
}
