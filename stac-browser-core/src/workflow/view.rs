//! Collaborators outside the core: stage views and the download subsystem
//!
//! Views are opaque to the controller. It only shows, raises and closes
//! them, and hands them their stage payload when they are built.

use anyhow::Result;

use super::events::DownloadRequest;
use super::stage::{StageId, StagePayload};
use crate::catalog::Item;

/// A dialog-like holder for one stage
pub trait StageView: Send {
    fn show(&mut self);

    /// Bring an existing view back to the foreground
    fn raise(&mut self) {
        self.show();
    }

    fn close(&mut self);

    /// Progress text while work for this stage is running
    fn progress(&mut self, _message: &str) {}
}

/// Builds views and runs modal prompts
pub trait ViewFactory: Send {
    /// Whether a view is registered for `stage`
    fn supports(&self, stage: StageId) -> bool {
        !stage.is_transient()
    }

    fn create(&mut self, stage: StageId, payload: Option<&StagePayload>) -> Box<dyn StageView>;

    /// Modal download selection; `None` means cancelled
    fn select_downloads(&mut self, items: &[Item]) -> Option<Vec<Item>>;
}

/// External download subsystem
///
/// Fire-and-forget: the workflow resets as soon as a request is handed
/// over and never hears about its progress.
pub trait DownloadHandler: Send + Sync {
    fn start(&self, request: DownloadRequest) -> Result<()>;
}
