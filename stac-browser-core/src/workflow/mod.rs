//! Browsing workflow
//!
//! A finite-state machine over the stages a user walks through:
//! collection loading, query, item loading, results and a transient
//! downloading stage. Each stage owns a typed payload and an opaque view.

mod controller;
mod events;
mod session;
mod stage;
mod view;

pub use controller::{Clock, WorkflowController};
pub use events::{Command, DownloadRequest, WorkflowEvent};
pub use session::WorkflowSession;
pub use stage::{
    ApiCollections, ItemLoadingPayload, QueryPayload, ResultsPayload, StageId, StagePayload,
    StageRecord, WorkflowState,
};
pub use view::{DownloadHandler, StageView, ViewFactory};
