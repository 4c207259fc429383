//! Event loop around the workflow controller
//!
//! Every event goes through one unbounded queue with a single consumer,
//! so the controller sees events strictly one at a time. Network work runs
//! in spawned tasks that post their completion back onto the queue.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::controller::WorkflowController;
use super::events::{Command, WorkflowEvent};
use super::stage::ItemLoadingPayload;
use super::view::DownloadHandler;
use crate::catalog::{load_apis, Api, Item};
use crate::config::save_config;
use crate::error::Result;
use crate::http::HttpClient;

/// Owns the controller and runs the commands it emits
pub struct WorkflowSession {
    controller: WorkflowController,
    client: Arc<dyn HttpClient>,
    downloads: Arc<dyn DownloadHandler>,
    config_path: Option<PathBuf>,
    events_tx: mpsc::UnboundedSender<WorkflowEvent>,
    events_rx: mpsc::UnboundedReceiver<WorkflowEvent>,
}

impl WorkflowSession {
    pub fn new(
        controller: WorkflowController,
        client: Arc<dyn HttpClient>,
        downloads: Arc<dyn DownloadHandler>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            client,
            downloads,
            config_path: None,
            events_tx,
            events_rx,
        }
    }

    /// Persist settings here whenever the controller asks
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Sender for posting events from other tasks
    pub fn sender(&self) -> mpsc::UnboundedSender<WorkflowEvent> {
        self.events_tx.clone()
    }

    pub fn controller(&self) -> &WorkflowController {
        &self.controller
    }

    /// Dispatch one event immediately and run its commands
    pub fn handle(&mut self, event: WorkflowEvent) {
        for command in self.controller.dispatch(event) {
            self.execute(command);
        }
    }

    /// Wait for the next queued event and handle it
    ///
    /// Returns `false` once the queue is closed.
    pub async fn next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle(event);
                true
            }
            None => false,
        }
    }

    /// Handle queued events until `done` holds for the controller
    pub async fn run_until<F>(&mut self, done: F)
    where
        F: Fn(&WorkflowController) -> bool,
    {
        while !done(&self.controller) {
            if !self.next_event().await {
                break;
            }
        }
    }

    fn execute(&self, command: Command) {
        match command {
            Command::LoadCollections { epoch, api_hrefs } => {
                let client = Arc::clone(&self.client);
                let events = self.sender();
                tokio::spawn(async move {
                    let apis = load_apis(client.as_ref(), &api_hrefs).await;
                    let _ = events.send(WorkflowEvent::CollectionsLoaded { epoch, apis });
                });
            }
            Command::SearchItems {
                epoch,
                request,
                limit,
            } => {
                let client = Arc::clone(&self.client);
                let events = self.sender();
                tokio::spawn(async move {
                    let event = match search_all(client.as_ref(), &request, limit, epoch, &events).await {
                        Ok(items) => WorkflowEvent::ItemsLoaded { epoch, items },
                        Err(e) => WorkflowEvent::ItemsFailed {
                            epoch,
                            error: e.to_string(),
                        },
                    };
                    let _ = events.send(event);
                });
            }
            Command::Download(request) => {
                if let Err(e) = self.downloads.start(request) {
                    warn!("Download hand-off failed: {:#}", e);
                }
            }
            Command::PersistConfig(config) => match &self.config_path {
                Some(path) => {
                    if let Err(e) = save_config(&config, path) {
                        warn!("Failed to save settings: {:#}", e);
                    }
                }
                None => debug!("No settings path configured, not persisting"),
            },
        }
    }
}

/// Search every picked API in order and concatenate the items
async fn search_all(
    client: &dyn HttpClient,
    request: &ItemLoadingPayload,
    limit: u32,
    epoch: u64,
    events: &mpsc::UnboundedSender<WorkflowEvent>,
) -> Result<Vec<Item>> {
    let progress = {
        let events = events.clone();
        move |api: &Api, page: u32| {
            let _ = events.send(WorkflowEvent::SearchProgress {
                epoch,
                api_href: api.href().to_string(),
                page,
            });
        }
    };

    let mut items = Vec::new();
    for (api, search) in request.searches(limit) {
        items.extend(api.search_items(client, &search, Some(&progress)).await?);
    }
    Ok(items)
}
