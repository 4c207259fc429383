//! Headless run of the browse workflow
//!
//! Stage views print to stderr, download selection keeps the first N
//! items, and the download hand-off prints the request as JSON.

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use stac_browser_core::catalog::{Api, Item};
use stac_browser_core::config::ConfigStore;
use stac_browser_core::http::ReqwestClient;
use stac_browser_core::workflow::{
    ApiCollections, DownloadHandler, DownloadRequest, StageId, StagePayload, StageView,
    ViewFactory, WorkflowController, WorkflowEvent, WorkflowSession,
};

use crate::QueryArgs;

struct ConsoleView {
    stage: StageId,
    summary: String,
}

impl StageView for ConsoleView {
    fn show(&mut self) {
        if self.summary.is_empty() {
            eprintln!("[{}]", self.stage);
        } else {
            eprintln!("[{}] {}", self.stage, self.summary);
        }
    }

    fn raise(&mut self) {
        debug!("Raising {}", self.stage);
        self.show();
    }

    fn close(&mut self) {
        debug!("Closing {}", self.stage);
    }

    fn progress(&mut self, message: &str) {
        eprintln!("[{}] {}", self.stage, message);
    }
}

/// Views for a terminal without interaction
pub struct ConsoleViews {
    max_downloads: usize,
}

impl ConsoleViews {
    pub fn new(max_downloads: usize) -> Self {
        Self { max_downloads }
    }
}

fn summarize(payload: Option<&StagePayload>) -> String {
    match payload {
        Some(StagePayload::Query(query)) => {
            let collections: usize = query.apis.iter().map(|api| api.collections().len()).sum();
            format!(
                "{} catalog(s), {} collection(s)",
                query.apis.len(),
                collections
            )
        }
        Some(StagePayload::ItemLoading(request)) => {
            format!(
                "Searching {} API(s) for {}",
                request.api_collections.len(),
                request.time_period.to_query_string()
            )
        }
        Some(StagePayload::Results(results)) => format!("{} item(s)", results.items.len()),
        None => String::new(),
    }
}

impl ViewFactory for ConsoleViews {
    fn create(&mut self, stage: StageId, payload: Option<&StagePayload>) -> Box<dyn StageView> {
        Box::new(ConsoleView {
            stage,
            summary: summarize(payload),
        })
    }

    fn select_downloads(&mut self, items: &[Item]) -> Option<Vec<Item>> {
        if self.max_downloads == 0 {
            return None;
        }
        Some(items.iter().take(self.max_downloads).cloned().collect())
    }
}

/// Prints each download request to stdout
pub struct PrintDownloads;

impl DownloadHandler for PrintDownloads {
    fn start(&self, request: DownloadRequest) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(&request)?);
        Ok(())
    }
}

/// Pick the requested collections from every API that offers them
///
/// With no ids every collection of every API is picked.
fn pick_collections(apis: &[Api], ids: &[String]) -> Vec<ApiCollections> {
    if ids.is_empty() {
        return apis
            .iter()
            .map(|api| ApiCollections {
                api: api.clone(),
                collections: api.collections().to_vec(),
            })
            .collect();
    }

    for id in ids {
        if !apis.iter().any(|api| api.collection(id).is_some()) {
            warn!("Collection '{}' is not offered by any configured API", id);
        }
    }

    apis.iter()
        .filter_map(|api| {
            let collections: Vec<_> = api
                .collections()
                .iter()
                .filter(|c| c.id().is_some_and(|id| ids.iter().any(|wanted| wanted == id)))
                .cloned()
                .collect();

            (!collections.is_empty()).then(|| ApiCollections {
                api: api.clone(),
                collections,
            })
        })
        .collect()
}

pub async fn execute_browse(
    store: ConfigStore,
    query: &QueryArgs,
    download_dir: PathBuf,
    max_downloads: usize,
) -> Result<()> {
    let config = store.config().clone();
    let client = Arc::new(ReqwestClient::new(config.timeout_seconds)?);
    let controller = WorkflowController::new(Box::new(ConsoleViews::new(max_downloads)), config);
    let mut session = WorkflowSession::new(controller, client, Arc::new(PrintDownloads))
        .with_config_path(store.path().to_path_buf());

    session.handle(WorkflowEvent::Open);
    session
        .run_until(|c| c.current_stage() != StageId::CollectionLoading)
        .await;

    let apis = session
        .controller()
        .state()
        .query_payload()
        .map(|query| query.apis.clone())
        .unwrap_or_default();

    let api_collections = pick_collections(&apis, &query.collections);
    if api_collections.is_empty() && !query.collections.is_empty() {
        session.handle(WorkflowEvent::Close);
        bail!(
            "None of the requested collections ({}) were found",
            query.collections.join(", ")
        );
    }

    session.handle(WorkflowEvent::Search {
        api_collections,
        extent: query.extent(),
        time_period: query.time_period(),
    });
    session
        .run_until(|c| c.current_stage() != StageId::ItemLoading)
        .await;

    let items = match session.controller().state().results_payload() {
        Some(results) => results.items.clone(),
        None => {
            session.handle(WorkflowEvent::Close);
            bail!("Item search failed");
        }
    };

    if items.is_empty() {
        eprintln!("No items found.");
        session.handle(WorkflowEvent::Close);
        return Ok(());
    }

    session.handle(WorkflowEvent::SelectDownloads {
        items,
        directory: download_dir,
    });

    if session.controller().current_stage() == StageId::Results {
        eprintln!("Download cancelled.");
        session.handle(WorkflowEvent::Close);
    }

    Ok(())
}
