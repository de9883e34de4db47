//! Per-item stage sequence.
//!
//! Each stage is skipped when its output artifact already exists, so an
//! interrupted or failed item resumes where it stopped on the next run. A
//! stage error ends the item but never the batch: it is returned as an
//! [`ItemStatus::Failed`] value rather than an `Err`.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use filingcast_artifacts::{
    ArtifactKind, ArtifactPaths, PublishReceipt, sha256_file, unpack_bundles,
};
use filingcast_shared::{
    AppConfig, FilingcastError, Item, ItemKey, Result, Stage, StockMetrics, Visibility,
};

use crate::presentation;
use crate::progress::ProgressReporter;
use crate::stages::{AcquireRequest, NarrateRequest, PublishRequest, RenderRequest, StageSet};
use crate::subtitle::write_srt;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Which stages a run executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StageSelection {
    #[default]
    All,
    Only(Stage),
}

impl StageSelection {
    pub fn includes(&self, stage: Stage) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => *only == stage,
        }
    }

    /// Artifact kind whose files enumerate the items of a run.
    pub fn discovery_kind(&self) -> ArtifactKind {
        match self {
            Self::All => ArtifactKind::RawDocument,
            Self::Only(stage) => ArtifactKind::consumed_by(*stage),
        }
    }

    /// Whether finding no items at all should abort the run.
    pub fn requires_documents(&self) -> bool {
        matches!(
            self,
            Self::All | Self::Only(Stage::Acquire) | Self::Only(Stage::Extract)
        )
    }
}

impl fmt::Display for StageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(stage) => write!(f, "{stage}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    pub selection: StageSelection,
    pub visibility: Visibility,
}

/// Processor settings taken from the application config.
#[derive(Debug, Clone, Default)]
pub struct ProcessorSettings {
    pub download_dir: PathBuf,
    pub base_tags: Vec<String>,
    pub category_id: String,
    pub require_metrics: bool,
}

impl From<&AppConfig> for ProcessorSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            download_dir: config.paths.download_dir.clone(),
            base_tags: config.publish.tags.clone(),
            category_id: config.publish.category_id.clone(),
            require_metrics: config.batch.require_metrics,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Pending,
    Running,
    Done,
    Skipped,
    Failed,
}

impl StageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub state: StageState,
}

/// Why an item stopped early without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The target section was not found in the document.
    SoftMiss,
    /// Metrics are required but could not be obtained.
    MetricsUnavailable,
    /// Single-stage run whose input artifact is absent.
    MissingInput(ArtifactKind),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SoftMiss => f.write_str("target section not found"),
            Self::MetricsUnavailable => f.write_str("metrics unavailable"),
            Self::MissingInput(kind) => write!(f, "missing {kind} input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Succeeded,
    Skipped { reason: SkipReason },
    Failed { stage: Stage, message: String },
}

/// Final result of one item.
#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub item_key: ItemKey,
    pub entity_name: String,
    pub status: ItemStatus,
    /// One report per selected stage, in execution order.
    pub stages: Vec<StageReport>,
}

impl ItemOutcome {
    pub fn state_of(&self, stage: Stage) -> Option<StageState> {
        self.stages.iter().find(|r| r.stage == stage).map(|r| r.state)
    }
}

/// Result of running one stage body.
enum StageRun {
    Done,
    Stop(SkipReason),
}

// ---------------------------------------------------------------------------
// ItemProcessor
// ---------------------------------------------------------------------------

pub struct ItemProcessor {
    stages: StageSet,
    paths: ArtifactPaths,
    settings: ProcessorSettings,
}

impl ItemProcessor {
    pub fn new(stages: StageSet, paths: ArtifactPaths, settings: ProcessorSettings) -> Self {
        Self {
            stages,
            paths,
            settings,
        }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    pub fn stages(&self) -> &StageSet {
        &self.stages
    }

    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    /// Unpack bundles from the download directory into raw documents.
    /// Returns how many documents were written.
    pub async fn unpack_downloads(&self) -> Result<usize> {
        let paths = self.paths.clone();
        off_runtime(self.settings.download_dir.clone(), move |dir| {
            unpack_bundles(dir, &paths)
        })
        .await
    }

    /// Run the selected stages for `item`, skipping those already done.
    #[instrument(skip_all, fields(item = %item.key, selection = %options.selection))]
    pub async fn process(
        &self,
        item: &Item,
        options: &ProcessOptions,
        progress: &dyn ProgressReporter,
    ) -> ItemOutcome {
        let mut run = ItemRun::new(item, options, progress);

        for stage in Stage::ALL {
            if !options.selection.includes(stage) {
                continue;
            }

            let artifact = self.paths.artifact(&item.key, ArtifactKind::produced_by(stage));
            if artifact.exists {
                debug!(%stage, path = %artifact.path.display(), "artifact exists, skipping stage");
                run.set(stage, StageState::Skipped);
                continue;
            }

            if let StageSelection::Only(_) = options.selection {
                let input = ArtifactKind::consumed_by(stage);
                if stage != Stage::Acquire && !self.paths.exists(&item.key, input) {
                    info!(%stage, input = %input, "input artifact missing");
                    run.set(stage, StageState::Skipped);
                    return run.finish(ItemStatus::Skipped {
                        reason: SkipReason::MissingInput(input),
                    });
                }
            }

            if self.settings.require_metrics
                && stage != Stage::Acquire
                && run.metrics(self).await.is_none()
            {
                info!(entity = %item.entity_name, "no metrics, skipping item");
                run.set(stage, StageState::Skipped);
                return run.finish(ItemStatus::Skipped {
                    reason: SkipReason::MetricsUnavailable,
                });
            }

            run.set(stage, StageState::Running);
            match self.run_stage(stage, &mut run).await {
                Ok(StageRun::Done) => {
                    debug!(%stage, "stage done");
                    run.set(stage, StageState::Done);
                }
                Ok(StageRun::Stop(reason)) => {
                    warn!(%stage, %reason, "item skipped");
                    run.set(stage, StageState::Skipped);
                    return run.finish(ItemStatus::Skipped { reason });
                }
                Err(e) => {
                    warn!(%stage, error = %e, "stage failed, abandoning item");
                    run.set(stage, StageState::Failed);
                    return run.finish(ItemStatus::Failed {
                        stage,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!("item complete");
        run.finish(ItemStatus::Succeeded)
    }

    async fn run_stage(&self, stage: Stage, run: &mut ItemRun<'_>) -> Result<StageRun> {
        match stage {
            Stage::Acquire => self.acquire(run.item).await,
            Stage::Extract => self.extract(run).await,
            Stage::Narrate => self.narrate(run.item).await,
            Stage::Render => self.render(run).await,
            Stage::Publish => self.publish(run).await,
        }
    }

    fn path(&self, item: &Item, kind: ArtifactKind) -> PathBuf {
        self.paths.path_for(&item.key, kind)
    }

    fn existing(&self, item: &Item, kind: ArtifactKind) -> Option<PathBuf> {
        let path = self.path(item, kind);
        path.exists().then_some(path)
    }

    async fn read_text(&self, item: &Item) -> Result<(PathBuf, String)> {
        let path = self.path(item, ArtifactKind::ExtractedText);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FilingcastError::io(&path, e))?;
        Ok((path, text))
    }

    // -- stages -------------------------------------------------------------

    async fn acquire(&self, item: &Item) -> Result<StageRun> {
        let request = AcquireRequest {
            entity: Some(item.entity_name.clone()),
            date: item.publication_date,
            limit: Some(1),
            dest_dir: self.paths.dir().to_path_buf(),
            download_dir: self.settings.download_dir.clone(),
        };
        let files = self.stages.acquirer.acquire(&request).await?;
        let unpacked = self.unpack_downloads().await?;
        debug!(count = files.len(), unpacked, "documents acquired");
        Ok(StageRun::Done)
    }

    async fn extract(&self, run: &mut ItemRun<'_>) -> Result<StageRun> {
        let item = run.item;
        let text = self
            .stages
            .extractor
            .extract(&item.source_document_path)
            .await?;
        if text.trim().is_empty() {
            return Ok(StageRun::Stop(SkipReason::SoftMiss));
        }

        let intro = run
            .metrics(self)
            .await
            .map(|m| presentation::intro_text(&item.entity_name, &m))
            .unwrap_or_default();

        let output = self.path(item, ArtifactKind::ExtractedText);
        tokio::fs::write(&output, format!("{intro}{text}"))
            .await
            .map_err(|e| FilingcastError::io(&output, e))?;
        debug!(chars = text.chars().count(), "section text written");
        Ok(StageRun::Done)
    }

    async fn narrate(&self, item: &Item) -> Result<StageRun> {
        let (text_path, text) = self.read_text(item).await?;
        let request = NarrateRequest {
            text_path,
            text,
            output: self.path(item, ArtifactKind::Audio),
        };
        let narration = self.stages.narrator.narrate(&request).await?;

        if let Some(duration) = narration.duration {
            let subtitle = self.path(item, ArtifactKind::Subtitle);
            if !subtitle.exists() {
                match write_srt(&subtitle, &request.text, duration).await {
                    Ok(true) => debug!(path = %subtitle.display(), "subtitle written"),
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "subtitle not written"),
                }
            }
        }
        Ok(StageRun::Done)
    }

    async fn render(&self, run: &mut ItemRun<'_>) -> Result<StageRun> {
        let item = run.item;
        let (text_path, text) = self.read_text(item).await?;
        let request = RenderRequest {
            item_key: item.key.clone(),
            entity_name: item.entity_name.clone(),
            publication_date: item.publication_date,
            audio: self.path(item, ArtifactKind::Audio),
            text_path,
            text,
            metrics: run.metrics(self).await,
            subtitle: self.existing(item, ArtifactKind::Subtitle),
            output: self.path(item, ArtifactKind::Video),
            thumbnail: self.path(item, ArtifactKind::Thumbnail),
        };
        self.stages.renderer.render(&request).await?;
        Ok(StageRun::Done)
    }

    async fn publish(&self, run: &mut ItemRun<'_>) -> Result<StageRun> {
        let item = run.item;
        let video = self.path(item, ArtifactKind::Video);
        let video_sha256 = off_runtime(video.clone(), sha256_file).await?;
        let metrics = run.metrics(self).await;

        let code = metrics.as_ref().and_then(|m| m.code.as_deref());
        let request = PublishRequest {
            item_key: item.key.clone(),
            title: presentation::video_title(&item.entity_name, item.publication_date, code),
            description: presentation::description(&item.entity_name, metrics.as_ref()),
            tags: presentation::tags(&self.settings.base_tags, &item.entity_name),
            category_id: self.settings.category_id.clone(),
            visibility: run.options.visibility,
            subtitle: self.existing(item, ArtifactKind::Subtitle),
            thumbnail: self.existing(item, ArtifactKind::Thumbnail),
            video,
        };
        let content_id = self.stages.publisher.publish(&request).await?;
        info!(%content_id, visibility = %request.visibility, "published");

        let receipt = PublishReceipt {
            item_key: item.key.clone(),
            content_id,
            title: request.title,
            visibility: request.visibility,
            video_sha256,
            published_at: Utc::now(),
        };
        let receipt_path = self.path(item, ArtifactKind::PublishReceipt);
        off_runtime(receipt_path, move |path| receipt.write(path)).await?;
        Ok(StageRun::Done)
    }
}

/// Run synchronous file work on the blocking pool.
pub(crate) async fn off_runtime<T, F>(path: PathBuf, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Path) -> Result<T> + Send + 'static,
{
    let at = path.clone();
    tokio::task::spawn_blocking(move || work(&path))
        .await
        .map_err(|e| FilingcastError::io(at, e.into()))?
}

// ---------------------------------------------------------------------------
// ItemRun
// ---------------------------------------------------------------------------

/// Mutable state of one `process` call.
struct ItemRun<'a> {
    item: &'a Item,
    options: &'a ProcessOptions,
    progress: &'a dyn ProgressReporter,
    reports: Vec<StageReport>,
    /// Fetched at most once per item; `Some(None)` caches a failed lookup.
    metrics: Option<Option<StockMetrics>>,
}

impl<'a> ItemRun<'a> {
    fn new(
        item: &'a Item,
        options: &'a ProcessOptions,
        progress: &'a dyn ProgressReporter,
    ) -> Self {
        let reports = Stage::ALL
            .into_iter()
            .filter(|s| options.selection.includes(*s))
            .map(|stage| StageReport {
                stage,
                state: StageState::Pending,
            })
            .collect();
        Self {
            item,
            options,
            progress,
            reports,
            metrics: None,
        }
    }

    fn set(&mut self, stage: Stage, state: StageState) {
        if let Some(report) = self.reports.iter_mut().find(|r| r.stage == stage) {
            report.state = state;
        }
        self.progress.stage_state(self.item, stage, state);
    }

    async fn metrics(&mut self, processor: &ItemProcessor) -> Option<StockMetrics> {
        if self.metrics.is_none() {
            let fetched = processor.stages.metrics.metrics(&self.item.entity_name).await;
            self.metrics = Some(fetched);
        }
        self.metrics.clone().flatten()
    }

    fn finish(self, status: ItemStatus) -> ItemOutcome {
        ItemOutcome {
            item_key: self.item.key.clone(),
            entity_name: self.item.entity_name.clone(),
            status,
            stages: self.reports,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use crate::test_support::{Script, raw_item, processor};

    fn full() -> ProcessOptions {
        ProcessOptions::default()
    }

    #[tokio::test]
    async fn full_run_produces_every_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let script = Script::new().into_arc();
        let processor = processor(tmp.path(), &script);
        let item = raw_item(processor.paths(), "Acme_20250512");

        let outcome = processor.process(&item, &full(), &SilentProgress).await;

        assert_eq!(outcome.status, ItemStatus::Succeeded);
        assert_eq!(outcome.state_of(Stage::Acquire), Some(StageState::Skipped));
        for stage in [Stage::Extract, Stage::Narrate, Stage::Render, Stage::Publish] {
            assert_eq!(outcome.state_of(stage), Some(StageState::Done), "{stage}");
        }
        for kind in [
            ArtifactKind::ExtractedText,
            ArtifactKind::Audio,
            ArtifactKind::Subtitle,
            ArtifactKind::Video,
            ArtifactKind::PublishReceipt,
        ] {
            assert!(processor.paths().exists(&item.key, kind), "{kind}");
        }

        let receipt = PublishReceipt::read(
            &processor.paths().path_for(&item.key, ArtifactKind::PublishReceipt),
        )
        .unwrap();
        assert_eq!(receipt.content_id, "content-Acme_20250512");
        assert_eq!(receipt.title, "Acme 2025年5月12日 決算サマリー");
        let video = processor.paths().path_for(&item.key, ArtifactKind::Video);
        assert_eq!(receipt.video_sha256, sha256_file(&video).unwrap());
        assert_eq!(script.calls.snapshot(), [0, 1, 1, 1, 1]);
    }

    #[tokio::test]
    async fn second_run_calls_no_stage() {
        let tmp = tempfile::tempdir().unwrap();
        let script = Script::new().into_arc();
        let processor = processor(tmp.path(), &script);
        let item = raw_item(processor.paths(), "Acme_20250512");

        processor.process(&item, &full(), &SilentProgress).await;
        let before = script.calls.snapshot();

        let outcome = processor.process(&item, &full(), &SilentProgress).await;
        assert_eq!(outcome.status, ItemStatus::Succeeded);
        assert!(outcome.stages.iter().all(|r| r.state == StageState::Skipped));
        assert_eq!(script.calls.snapshot(), before);
    }

    #[tokio::test]
    async fn failing_stage_stops_the_item() {
        let tmp = tempfile::tempdir().unwrap();
        let script = Script::new().fail(Stage::Narrate, "Acme").into_arc();
        let processor = processor(tmp.path(), &script);
        let item = raw_item(processor.paths(), "Acme_20250512");

        let outcome = processor.process(&item, &full(), &SilentProgress).await;

        match &outcome.status {
            ItemStatus::Failed { stage, message } => {
                assert_eq!(*stage, Stage::Narrate);
                assert!(message.contains("synthesis failed"), "{message}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(outcome.state_of(Stage::Narrate), Some(StageState::Failed));
        assert_eq!(outcome.state_of(Stage::Render), Some(StageState::Pending));
        assert_eq!(outcome.state_of(Stage::Publish), Some(StageState::Pending));
        assert_eq!(script.calls.snapshot(), [0, 1, 1, 0, 0]);
        // Extraction is kept, so the retry starts at narration.
        assert!(processor.paths().exists(&item.key, ArtifactKind::ExtractedText));
    }

    #[tokio::test]
    async fn soft_miss_writes_no_text() {
        let tmp = tempfile::tempdir().unwrap();
        let script = Script::new().soft_miss("Beta").into_arc();
        let processor = processor(tmp.path(), &script);
        let item = raw_item(processor.paths(), "Beta_20250512");

        let outcome = processor.process(&item, &full(), &SilentProgress).await;

        assert_eq!(
            outcome.status,
            ItemStatus::Skipped {
                reason: SkipReason::SoftMiss
            }
        );
        assert!(!processor.paths().exists(&item.key, ArtifactKind::ExtractedText));
        assert_eq!(script.calls.snapshot(), [0, 1, 0, 0, 0]);
    }

    #[tokio::test]
    async fn metrics_prefix_the_text_and_reach_the_title() {
        let tmp = tempfile::tempdir().unwrap();
        let script = Script::new().with_metrics().into_arc();
        let processor = processor(tmp.path(), &script);
        let item = raw_item(processor.paths(), "Acme_20250512");

        processor.process(&item, &full(), &SilentProgress).await;

        let text = std::fs::read_to_string(
            processor.paths().path_for(&item.key, ArtifactKind::ExtractedText),
        )
        .unwrap();
        assert!(text.starts_with("【Acme】 / PER: 12.5 / PBR: 1.10\n\n"), "{text}");
        assert!(text.ends_with("Revenue grew 10%.\n\nCosts fell sharply."));

        let receipt = PublishReceipt::read(
            &processor.paths().path_for(&item.key, ArtifactKind::PublishReceipt),
        )
        .unwrap();
        assert_eq!(receipt.title, "【1234】Acme 2025年5月12日 決算サマリー");
        // One lookup shared by extract, render and publish.
        assert_eq!(script.calls.metrics(), 1);
    }

    #[tokio::test]
    async fn required_metrics_gate_skips_item() {
        let tmp = tempfile::tempdir().unwrap();
        let script = Script::new().into_arc();
        let settings = ProcessorSettings {
            require_metrics: true,
            ..Default::default()
        };
        let processor = crate::test_support::processor_with(tmp.path(), &script, settings);
        let item = raw_item(processor.paths(), "Acme_20250512");

        let outcome = processor.process(&item, &full(), &SilentProgress).await;

        assert_eq!(
            outcome.status,
            ItemStatus::Skipped {
                reason: SkipReason::MetricsUnavailable
            }
        );
        assert_eq!(script.calls.snapshot(), [0, 0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn single_stage_needs_its_input() {
        let tmp = tempfile::tempdir().unwrap();
        let script = Script::new().into_arc();
        let processor = processor(tmp.path(), &script);
        let item = raw_item(processor.paths(), "Acme_20250512");
        let options = ProcessOptions {
            selection: StageSelection::Only(Stage::Render),
            ..Default::default()
        };

        let outcome = processor.process(&item, &options, &SilentProgress).await;
        assert_eq!(
            outcome.status,
            ItemStatus::Skipped {
                reason: SkipReason::MissingInput(ArtifactKind::Audio)
            }
        );
        assert_eq!(outcome.stages.len(), 1);
        assert_eq!(script.calls.snapshot(), [0, 0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn single_stage_runs_only_that_stage() {
        let tmp = tempfile::tempdir().unwrap();
        let script = Script::new().into_arc();
        let processor = processor(tmp.path(), &script);
        let item = raw_item(processor.paths(), "Acme_20250512");
        let options = ProcessOptions {
            selection: StageSelection::Only(Stage::Extract),
            ..Default::default()
        };

        let outcome = processor.process(&item, &options, &SilentProgress).await;
        assert_eq!(outcome.status, ItemStatus::Succeeded);
        assert_eq!(script.calls.snapshot(), [0, 1, 0, 0, 0]);
        assert!(!processor.paths().exists(&item.key, ArtifactKind::Audio));
    }

    #[tokio::test]
    async fn missing_raw_document_is_acquired() {
        let tmp = tempfile::tempdir().unwrap();
        let script = Script::new()
            .acquirable("Acme_20250512_qualitative.htm")
            .into_arc();
        let processor = processor(tmp.path(), &script);
        std::fs::create_dir_all(processor.paths().dir()).unwrap();
        let date = chrono::NaiveDate::from_ymd_opt(2025, 5, 12);
        let raw = processor
            .paths()
            .path_for(&ItemKey::new("Acme", date), ArtifactKind::RawDocument);
        let item = Item::new("Acme", date, raw);

        let outcome = processor.process(&item, &full(), &SilentProgress).await;
        assert_eq!(outcome.status, ItemStatus::Succeeded);
        assert_eq!(outcome.state_of(Stage::Acquire), Some(StageState::Done));
        assert_eq!(script.calls.snapshot(), [1, 1, 1, 1, 1]);
        assert!(item.source_document_path.exists());
    }

    #[tokio::test]
    async fn acquired_bundle_is_unpacked_for_the_item() {
        let tmp = tempfile::tempdir().unwrap();
        let script = Script::new().bundled("Acme_20250512_tdnet0001.zip").into_arc();
        let processor = processor(tmp.path(), &script);
        let date = chrono::NaiveDate::from_ymd_opt(2025, 5, 12);
        let raw = processor
            .paths()
            .path_for(&ItemKey::new("Acme", date), ArtifactKind::RawDocument);
        let item = Item::new("Acme", date, raw);

        let outcome = processor.process(&item, &full(), &SilentProgress).await;

        assert_eq!(outcome.status, ItemStatus::Succeeded);
        assert_eq!(
            std::fs::read_to_string(&item.source_document_path).unwrap(),
            "<p>filing</p>"
        );
        assert_eq!(processor.unpack_downloads().await.unwrap(), 0);
    }

    #[test]
    fn selection_discovery_kinds() {
        assert_eq!(StageSelection::All.discovery_kind(), ArtifactKind::RawDocument);
        assert_eq!(
            StageSelection::Only(Stage::Publish).discovery_kind(),
            ArtifactKind::Video
        );
        assert!(StageSelection::Only(Stage::Extract).requires_documents());
        assert!(!StageSelection::Only(Stage::Narrate).requires_documents());
    }
}
