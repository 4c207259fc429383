//! Workflow state machine
//!
//! ```text
//! COLLECTION_LOADING ──loaded──▶ QUERY ──search──▶ ITEM_LOADING ──loaded──▶ RESULTS
//!        ▲                         ▲                     │                    │
//!        │                         └──────failed─────────┘                    │
//!        │                         └──────────────────back────────────────────┤
//!        └───────────── close (any stage) / download (via DOWNLOADING) ───────┘
//! ```
//!
//! Every event goes through [`WorkflowController::dispatch`], which returns
//! the commands the caller must run. The controller itself never blocks.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use super::events::{Command, DownloadRequest, WorkflowEvent};
use super::stage::{
    ApiCollections, ItemLoadingPayload, QueryPayload, ResultsPayload, StageHandle, StageId,
    StagePayload, WorkflowState,
};
use super::view::ViewFactory;
use crate::catalog::{Api, Item, Rectangle, TimePeriod};
use crate::config::BrowserConfig;
use crate::error::{Result, StacError};

/// Source of the current time, used for the catalog freshness check
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send>;

/// Single-workflow controller
pub struct WorkflowController {
    state: WorkflowState,
    views: Box<dyn ViewFactory>,
    config: BrowserConfig,
    clock: Clock,
    /// Bumped on every stage entry and reset
    epoch: u64,
    commands: Vec<Command>,
}

impl WorkflowController {
    pub fn new(views: Box<dyn ViewFactory>, config: BrowserConfig) -> Self {
        Self {
            state: WorkflowState::new(),
            views,
            config,
            clock: Box::new(Utc::now),
            epoch: 0,
            commands: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn current_stage(&self) -> StageId {
        self.state.current()
    }

    /// Epoch that completion events must carry to be accepted
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Apply one event and return the commands it produced
    ///
    /// Internal errors (such as an unregistered stage) are logged and
    /// leave the state as it was.
    pub fn dispatch(&mut self, event: WorkflowEvent) -> Vec<Command> {
        debug!(
            stage = %self.state.current(),
            event = event.name(),
            epoch = self.epoch,
            "Dispatching workflow event"
        );

        // Close is valid from every stage
        let result = match event {
            WorkflowEvent::Close => {
                self.reset();
                Ok(())
            }
            other => self.route(other),
        };

        if let Err(e) = result {
            error!("{}", e);
        }

        std::mem::take(&mut self.commands)
    }

    fn route(&mut self, event: WorkflowEvent) -> Result<()> {
        use StageId::*;

        let epoch = self.epoch;
        match (self.state.current(), event) {
            (_, WorkflowEvent::Open) => self.load_window(),

            (CollectionLoading, WorkflowEvent::CollectionsLoaded { epoch: e, apis }) if e == epoch => {
                self.collection_load_finished(apis)
            }

            (
                Query,
                WorkflowEvent::Search {
                    api_collections,
                    extent,
                    time_period,
                },
            ) => self.on_search(api_collections, extent, time_period),

            (ItemLoading, WorkflowEvent::SearchProgress { epoch: e, api_href, page }) if e == epoch => {
                self.report_progress(&api_href, page);
                Ok(())
            }
            (ItemLoading, WorkflowEvent::ItemsLoaded { epoch: e, items }) if e == epoch => {
                self.item_load_finished(items)
            }
            (ItemLoading, WorkflowEvent::ItemsFailed { epoch: e, error }) if e == epoch => {
                self.results_error(&error)
            }

            (Results, WorkflowEvent::Back) => self.on_back(),
            (Results, WorkflowEvent::SelectDownloads { items, directory }) => {
                self.select_downloads(items, directory)
            }
            (Results, WorkflowEvent::Download { items, directory }) => {
                self.on_download(items, directory);
                Ok(())
            }

            (stage, event) => {
                debug!(
                    "Ignoring '{}' event in stage {} (epoch {})",
                    event.name(),
                    stage,
                    epoch
                );
                Ok(())
            }
        }
    }

    fn ensure_registered(&self, stage: StageId) -> Result<()> {
        if self.views.supports(stage) {
            Ok(())
        } else {
            Err(StacError::UnknownStage(stage))
        }
    }

    fn collection_load_finished(&mut self, apis: Vec<Api>) -> Result<()> {
        self.ensure_registered(StageId::Query)?;

        info!("Loaded {} catalogs", apis.len());
        if self.config.is_complete(&apis) {
            let now = (self.clock)();
            self.config.record_apis(&apis, now);
            self.commands.push(Command::PersistConfig(self.config.clone()));
        } else {
            warn!(
                "Only {} of {} catalogs loaded, not caching them",
                apis.len(),
                self.config.api_hrefs.len()
            );
        }

        self.state.record_mut(StageId::Query).payload =
            Some(StagePayload::Query(QueryPayload { apis }));
        self.state.record_mut(StageId::CollectionLoading).close();
        self.enter(StageId::Query)
    }

    fn on_search(
        &mut self,
        api_collections: Vec<ApiCollections>,
        extent: Option<Rectangle>,
        time_period: TimePeriod,
    ) -> Result<()> {
        self.ensure_registered(StageId::ItemLoading)?;

        let payload = ItemLoadingPayload {
            api_collections,
            extent: extent.map(|r| r.to_bbox()).unwrap_or_default(),
            time_period,
        };
        self.state.record_mut(StageId::ItemLoading).payload =
            Some(StagePayload::ItemLoading(payload));

        // Hidden, not dropped: going back re-raises it with its inputs intact
        self.state.record_mut(StageId::Query).close();
        self.enter(StageId::ItemLoading)
    }

    fn report_progress(&mut self, api_href: &str, page: u32) {
        if let Some(handle) = self.state.record_mut(StageId::ItemLoading).handle.as_mut() {
            handle
                .view
                .progress(&format!("Searching {api_href} (page {page})"));
        }
    }

    fn item_load_finished(&mut self, items: Vec<Item>) -> Result<()> {
        self.ensure_registered(StageId::Results)?;

        info!("Search returned {} items", items.len());
        self.state.record_mut(StageId::Results).payload =
            Some(StagePayload::Results(ResultsPayload { items }));
        self.state.record_mut(StageId::ItemLoading).clear();
        self.enter(StageId::Results)
    }

    fn results_error(&mut self, reason: &str) -> Result<()> {
        self.ensure_registered(StageId::Query)?;

        warn!("Item search failed: {}", reason);
        self.state.record_mut(StageId::ItemLoading).clear();
        self.enter(StageId::Query)
    }

    fn on_back(&mut self) -> Result<()> {
        self.ensure_registered(StageId::Query)?;

        self.state.record_mut(StageId::Results).clear();
        self.enter(StageId::Query)
    }

    fn select_downloads(&mut self, items: Vec<Item>, directory: PathBuf) -> Result<()> {
        match self.views.select_downloads(&items) {
            Some(chosen) => {
                self.on_download(chosen, directory);
            }
            None => debug!("Download selection cancelled"),
        }
        Ok(())
    }

    fn on_download(&mut self, items: Vec<Item>, directory: PathBuf) {
        let request = DownloadRequest {
            download_items: items,
            download_directory: directory,
        };

        info!(
            "Handing off {} items for download to {}",
            request.download_items.len(),
            request.download_directory.display()
        );

        debug!("Stage {} -> {}", self.state.current(), StageId::Downloading);
        self.state.set_current(StageId::Downloading);
        self.commands.push(Command::Download(request));
        self.reset();
    }

    fn enter(&mut self, stage: StageId) -> Result<()> {
        debug!("Stage {} -> {}", self.state.current(), stage);
        self.state.set_current(stage);
        self.epoch += 1;
        self.load_window()
    }

    /// Show the current stage, building its view only if none exists
    fn load_window(&mut self) -> Result<()> {
        if self.state.current() == StageId::CollectionLoading
            && !self.state.has_handle(StageId::CollectionLoading)
            && self.config.is_fresh((self.clock)())
        {
            self.ensure_registered(StageId::Query)?;

            debug!("Cached catalogs are fresh, skipping collection loading");
            let apis = self.config.cached_apis();
            self.state.record_mut(StageId::Query).payload =
                Some(StagePayload::Query(QueryPayload { apis }));
            self.state.set_current(StageId::Query);
            self.epoch += 1;
        }

        let stage = self.state.current();
        self.ensure_registered(stage)?;

        let record = self.state.record_mut(stage);
        let created = match record.handle.as_mut() {
            Some(handle) => {
                handle.view.raise();
                handle.open = true;
                false
            }
            None => {
                let mut view = self.views.create(stage, record.payload.as_ref());
                view.show();
                record.handle = Some(StageHandle { view, open: true });
                true
            }
        };

        if created {
            self.on_enter(stage);
        }
        Ok(())
    }

    /// Start the work a freshly built stage waits on
    fn on_enter(&mut self, stage: StageId) {
        match stage {
            StageId::CollectionLoading => {
                self.commands.push(Command::LoadCollections {
                    epoch: self.epoch,
                    api_hrefs: self.config.api_hrefs.clone(),
                });
            }
            StageId::ItemLoading => {
                if let Some(request) = self.state.item_loading_payload().cloned() {
                    self.commands.push(Command::SearchItems {
                        epoch: self.epoch,
                        request,
                        limit: self.config.search_limit,
                    });
                }
            }
            _ => {}
        }
    }

    /// Close every view, clear every payload, return to collection loading
    ///
    /// Safe to call repeatedly. Work still in flight is orphaned by the
    /// epoch bump.
    fn reset(&mut self) {
        self.state.reset();
        self.epoch += 1;
    }
}
