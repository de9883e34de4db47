//! Pipeline core for Filingcast.
//!
//! Stage ports and their external-command adapters, the per-item processor,
//! the batch orchestrator and the persisted schedule record used by
//! automatic runs.

pub mod batch;
pub mod external;
pub mod presentation;
pub mod processor;
pub mod progress;
pub mod schedule;
pub mod stages;
pub mod subtitle;

#[cfg(test)]
mod test_support;

pub use batch::{BatchOptions, BatchOrchestrator, BatchRunResult, ItemFailure, RunMode};
pub use processor::{
    ItemOutcome, ItemProcessor, ItemStatus, ProcessOptions, ProcessorSettings, SkipReason,
    StageReport, StageSelection, StageState,
};
pub use progress::{ProgressReporter, SilentProgress};
pub use schedule::{JsonScheduleStore, ScheduleConfig, ScheduleStore, TimeOfDay};
pub use stages::{HtmlSectionExtractor, NoMetrics, StageSet};
