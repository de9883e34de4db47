//! Progress callbacks for batch runs.

use filingcast_shared::{Item, Stage};

use crate::batch::BatchRunResult;
use crate::processor::{ItemOutcome, StageState};

/// Progress callback for reporting batch status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase (acquisition, discovery, processing).
    fn phase(&self, name: &str);
    /// Called before the first stage of an item runs. `index` is 1-based.
    fn item_started(&self, item: &Item, index: usize, total: usize);
    /// Called on every stage state change of the current item.
    fn stage_state(&self, item: &Item, stage: Stage, state: StageState);
    /// Called once the item has a final status.
    fn item_finished(&self, outcome: &ItemOutcome);
    /// Called when the batch completes.
    fn done(&self, result: &BatchRunResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item_started(&self, _item: &Item, _index: usize, _total: usize) {}
    fn stage_state(&self, _item: &Item, _stage: Stage, _state: StageState) {}
    fn item_finished(&self, _outcome: &ItemOutcome) {}
    fn done(&self, _result: &BatchRunResult) {}
}
