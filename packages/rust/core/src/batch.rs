//! Batch orchestration: acquire, discover, filter, process, tally.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use filingcast_artifacts::{discover_items, filter_by_date};
use filingcast_shared::{FilingcastError, ItemKey, Result, RunId, Stage, Visibility};

use crate::processor::{ItemOutcome, ItemProcessor, ItemStatus, ProcessOptions, StageSelection};
use crate::progress::ProgressReporter;
use crate::schedule::ScheduleConfig;
use crate::stages::AcquireRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Operator-driven run from the menu or a subcommand.
    Interactive,
    /// Unattended run driven by the schedule record.
    Automatic,
}

/// Options for a single batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub mode: RunMode,
    /// Only process items published on this date.
    pub date_filter: Option<NaiveDate>,
    /// Cap on the number of items processed (and acquired).
    pub limit: Option<usize>,
    pub selection: StageSelection,
    pub visibility: Visibility,
    /// Run the acquisition phase before discovery.
    pub acquire: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            mode: RunMode::Interactive,
            date_filter: None,
            limit: None,
            selection: StageSelection::All,
            visibility: Visibility::Public,
            acquire: true,
        }
    }
}

impl BatchOptions {
    /// Full run over today's filings as configured by the schedule record.
    pub fn automatic(schedule: &ScheduleConfig, today: NaiveDate, visibility: Visibility) -> Self {
        Self {
            mode: RunMode::Automatic,
            date_filter: Some(today),
            limit: Some(schedule.item_limit),
            selection: StageSelection::All,
            visibility,
            acquire: true,
        }
    }
}

/// A failed item, for the end-of-run report.
#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub item_key: ItemKey,
    pub entity_name: String,
    pub stage: Stage,
    pub message: String,
}

/// Aggregate result of one batch run.
#[derive(Debug, Clone)]
pub struct BatchRunResult {
    pub run_id: RunId,
    pub mode: RunMode,
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Raw documents unpacked from downloaded bundles by this run.
    pub unpacked: usize,
    pub failures: Vec<ItemFailure>,
    pub outcomes: Vec<ItemOutcome>,
    /// Set when the run stopped before processing any item.
    pub aborted: Option<String>,
    pub elapsed: Duration,
}

impl BatchRunResult {
    fn new(mode: RunMode) -> Self {
        Self {
            run_id: RunId::new(),
            mode,
            attempted: 0,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            unpacked: 0,
            failures: Vec::new(),
            outcomes: Vec::new(),
            aborted: None,
            elapsed: Duration::ZERO,
        }
    }

    fn record(&mut self, outcome: ItemOutcome) {
        self.attempted += 1;
        match &outcome.status {
            ItemStatus::Succeeded => self.succeeded += 1,
            ItemStatus::Skipped { .. } => self.skipped += 1,
            ItemStatus::Failed { stage, message } => {
                self.failed += 1;
                self.failures.push(ItemFailure {
                    item_key: outcome.item_key.clone(),
                    entity_name: outcome.entity_name.clone(),
                    stage: *stage,
                    message: message.clone(),
                });
            }
        }
        self.outcomes.push(outcome);
    }
}

// ---------------------------------------------------------------------------
// BatchOrchestrator
// ---------------------------------------------------------------------------

pub struct BatchOrchestrator {
    processor: ItemProcessor,
}

impl BatchOrchestrator {
    pub fn new(processor: ItemProcessor) -> Self {
        Self { processor }
    }

    pub fn processor(&self) -> &ItemProcessor {
        &self.processor
    }

    /// Run one batch.
    ///
    /// Per-item problems are contained in the returned result. `Err` means
    /// the output directory could not be prepared.
    #[instrument(skip_all, fields(mode = ?options.mode, selection = %options.selection))]
    pub async fn run(
        &self,
        options: &BatchOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchRunResult> {
        let start = Instant::now();
        let mut result = BatchRunResult::new(options.mode);
        let paths = self.processor.paths();

        tokio::fs::create_dir_all(paths.dir())
            .await
            .map_err(|e| FilingcastError::io(paths.dir(), e))?;

        // --- Phase 1: acquisition ---
        if options.acquire && options.selection.includes(Stage::Acquire) {
            progress.phase("Acquiring documents");
            let request = AcquireRequest {
                entity: None,
                date: options.date_filter,
                limit: options.limit,
                dest_dir: paths.dir().to_path_buf(),
                download_dir: self.processor.settings().download_dir.clone(),
            };
            match self.processor.stages().acquirer.acquire(&request).await {
                Ok(files) => info!(count = files.len(), "acquisition finished"),
                Err(e) => warn!(error = %e, "acquisition failed, using documents already on disk"),
            }
        }
        if options.selection.requires_documents() {
            match self.processor.unpack_downloads().await {
                Ok(count) => result.unpacked = count,
                Err(e) => warn!(error = %e, "downloaded bundles could not be unpacked"),
            }
        }

        // --- Phase 2: discovery ---
        progress.phase("Discovering items");
        let kind = options.selection.discovery_kind();
        let mut items = match discover_items(paths, kind) {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "discovery failed");
                result.aborted = Some(format!("discovery failed: {e}"));
                return Ok(self.finish(result, start, progress));
            }
        };
        let discovered = items.len();
        if let Some(date) = options.date_filter {
            items = filter_by_date(items, date);
        }
        if let Some(limit) = options.limit {
            items.truncate(limit);
        }
        info!(discovered, selected = items.len(), kind = %kind, "items discovered");

        if items.is_empty() {
            if options.selection.requires_documents() {
                warn!(unpacked = result.unpacked, "no source documents to process, aborting run");
                result.aborted = Some(format!(
                    "no source documents found ({} unpacked from bundles)",
                    result.unpacked
                ));
            } else {
                info!(kind = %kind, "nothing to process");
            }
            return Ok(self.finish(result, start, progress));
        }

        // --- Phase 3: per-item processing ---
        progress.phase("Processing items");
        let process_options = ProcessOptions {
            selection: options.selection,
            visibility: options.visibility,
        };
        let total = items.len();
        for (index, item) in items.iter().enumerate() {
            progress.item_started(item, index + 1, total);
            let outcome = self
                .processor
                .process(item, &process_options, progress)
                .await;
            progress.item_finished(&outcome);
            result.record(outcome);
        }

        Ok(self.finish(result, start, progress))
    }

    /// Automatic mode. Does nothing and returns `None` while disabled.
    #[instrument(skip_all, fields(today = %today))]
    pub async fn run_automatic(
        &self,
        schedule: &ScheduleConfig,
        today: NaiveDate,
        visibility: Visibility,
        progress: &dyn ProgressReporter,
    ) -> Result<Option<BatchRunResult>> {
        if !schedule.enabled {
            info!("automatic runs are disabled");
            return Ok(None);
        }
        let options = BatchOptions::automatic(schedule, today, visibility);
        self.run(&options, progress).await.map(Some)
    }

    fn finish(
        &self,
        mut result: BatchRunResult,
        start: Instant,
        progress: &dyn ProgressReporter,
    ) -> BatchRunResult {
        result.elapsed = start.elapsed();
        info!(
            run_id = %result.run_id,
            attempted = result.attempted,
            succeeded = result.succeeded,
            skipped = result.skipped,
            failed = result.failed,
            unpacked = result.unpacked,
            aborted = result.aborted.is_some(),
            elapsed_ms = result.elapsed.as_millis() as u64,
            "batch finished"
        );
        progress.done(&result);
        result
    }
}
