//! Workflow stages, their payloads and the per-stage records

use std::collections::BTreeMap;
use std::fmt;

use super::view::StageView;
use crate::catalog::{Api, Collection, Item, ItemSearch, TimePeriod};

/// Identifier of a workflow stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageId {
    CollectionLoading,
    Query,
    ItemLoading,
    Results,
    /// Transient: held only inside the dispatch that hands a download
    /// off, so no caller ever observes it and it has no payload or view
    Downloading,
}

impl StageId {
    pub const ALL: [StageId; 5] = [
        StageId::CollectionLoading,
        StageId::Query,
        StageId::ItemLoading,
        StageId::Results,
        StageId::Downloading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::CollectionLoading => "COLLECTION_LOADING",
            StageId::Query => "QUERY",
            StageId::ItemLoading => "ITEM_LOADING",
            StageId::Results => "RESULTS",
            StageId::Downloading => "DOWNLOADING",
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, StageId::Downloading)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalogs available for querying
#[derive(Debug, Clone)]
pub struct QueryPayload {
    pub apis: Vec<Api>,
}

/// Collections picked from one API
#[derive(Debug, Clone)]
pub struct ApiCollections {
    pub api: Api,
    pub collections: Vec<Collection>,
}

/// A query waiting to be run
#[derive(Debug, Clone)]
pub struct ItemLoadingPayload {
    pub api_collections: Vec<ApiCollections>,
    /// `[min-x, min-y, max-x, max-y]`, or empty for an unscoped search
    pub extent: Vec<f64>,
    pub time_period: TimePeriod,
}

impl ItemLoadingPayload {
    /// One search per API, in the order the APIs were picked
    pub fn searches(&self, limit: u32) -> Vec<(&Api, ItemSearch)> {
        self.api_collections
            .iter()
            .map(|entry| {
                let search = ItemSearch::new(&entry.collections, self.time_period)
                    .with_bbox(self.extent.clone())
                    .with_limit(limit);
                (&entry.api, search)
            })
            .collect()
    }
}

/// Items returned by a query
#[derive(Debug, Clone)]
pub struct ResultsPayload {
    pub items: Vec<Item>,
}

/// Typed data held by a stage
#[derive(Debug, Clone)]
pub enum StagePayload {
    Query(QueryPayload),
    ItemLoading(ItemLoadingPayload),
    Results(ResultsPayload),
}

impl StagePayload {
    pub fn stage(&self) -> StageId {
        match self {
            StagePayload::Query(_) => StageId::Query,
            StagePayload::ItemLoading(_) => StageId::ItemLoading,
            StagePayload::Results(_) => StageId::Results,
        }
    }
}

/// A view owned by a stage, open or hidden
pub(crate) struct StageHandle {
    pub(crate) view: Box<dyn StageView>,
    pub(crate) open: bool,
}

impl fmt::Debug for StageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageHandle").field("open", &self.open).finish()
    }
}

/// Payload and view handle of one stage
#[derive(Debug, Default)]
pub struct StageRecord {
    pub(crate) payload: Option<StagePayload>,
    pub(crate) handle: Option<StageHandle>,
}

impl StageRecord {
    pub fn payload(&self) -> Option<&StagePayload> {
        self.payload.as_ref()
    }

    /// Whether a view exists, open or hidden
    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_open(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| h.open)
    }

    /// Close the view but keep it, so re-entry restores its state
    pub(crate) fn close(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            if handle.open {
                handle.view.close();
                handle.open = false;
            }
        }
    }

    /// Close and drop the view and the payload
    pub(crate) fn clear(&mut self) {
        self.close();
        self.handle = None;
        self.payload = None;
    }
}

/// All stage records plus the current stage
#[derive(Debug)]
pub struct WorkflowState {
    current: StageId,
    records: BTreeMap<StageId, StageRecord>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        Self {
            current: StageId::CollectionLoading,
            records: StageId::ALL
                .iter()
                .map(|stage| (*stage, StageRecord::default()))
                .collect(),
        }
    }

    pub fn current(&self) -> StageId {
        self.current
    }

    pub(crate) fn set_current(&mut self, stage: StageId) {
        self.current = stage;
    }

    pub fn record(&self, stage: StageId) -> Option<&StageRecord> {
        self.records.get(&stage)
    }

    pub(crate) fn record_mut(&mut self, stage: StageId) -> &mut StageRecord {
        self.records.entry(stage).or_default()
    }

    pub fn payload(&self, stage: StageId) -> Option<&StagePayload> {
        self.record(stage).and_then(StageRecord::payload)
    }

    pub fn has_handle(&self, stage: StageId) -> bool {
        self.record(stage).is_some_and(StageRecord::has_handle)
    }

    pub fn is_open(&self, stage: StageId) -> bool {
        self.record(stage).is_some_and(StageRecord::is_open)
    }

    pub fn query_payload(&self) -> Option<&QueryPayload> {
        match self.payload(StageId::Query) {
            Some(StagePayload::Query(payload)) => Some(payload),
            _ => None,
        }
    }

    pub fn item_loading_payload(&self) -> Option<&ItemLoadingPayload> {
        match self.payload(StageId::ItemLoading) {
            Some(StagePayload::ItemLoading(payload)) => Some(payload),
            _ => None,
        }
    }

    pub fn results_payload(&self) -> Option<&ResultsPayload> {
        match self.payload(StageId::Results) {
            Some(StagePayload::Results(payload)) => Some(payload),
            _ => None,
        }
    }

    /// True when no stage holds a payload or a view
    pub fn is_clear(&self) -> bool {
        self.records
            .values()
            .all(|r| r.payload.is_none() && r.handle.is_none())
    }

    /// Close every open view, drop every payload, return to collection loading
    pub(crate) fn reset(&mut self) {
        for record in self.records.values_mut() {
            record.clear();
        }
        self.current = StageId::CollectionLoading;
    }
}
