//! Scripted stage doubles shared by the processor and batch tests.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use filingcast_artifacts::{ArtifactKind, ArtifactPaths};
use filingcast_shared::{FilingcastError, Item, Result, Stage, StockMetrics, SuffixConfig};

use crate::processor::{ItemProcessor, ProcessorSettings};
use crate::stages::{
    AcquireRequest, Acquirer, Extractor, MetricsSource, NarrateRequest, NarrationOutput,
    Narrator, PublishRequest, Publisher, RenderRequest, Renderer, StageSet,
};

pub(crate) const SECTION_TEXT: &str = "Revenue grew 10%.\n\nCosts fell sharply.";

#[derive(Default)]
pub(crate) struct Calls {
    acquire: AtomicUsize,
    extract: AtomicUsize,
    narrate: AtomicUsize,
    render: AtomicUsize,
    publish: AtomicUsize,
    metrics: AtomicUsize,
}

impl Calls {
    /// Stage call counts in pipeline order.
    pub(crate) fn snapshot(&self) -> [usize; 5] {
        [
            self.acquire.load(Ordering::SeqCst),
            self.extract.load(Ordering::SeqCst),
            self.narrate.load(Ordering::SeqCst),
            self.render.load(Ordering::SeqCst),
            self.publish.load(Ordering::SeqCst),
        ]
    }

    pub(crate) fn metrics(&self) -> usize {
        self.metrics.load(Ordering::SeqCst)
    }

    fn counter(&self, stage: Stage) -> &AtomicUsize {
        match stage {
            Stage::Acquire => &self.acquire,
            Stage::Extract => &self.extract,
            Stage::Narrate => &self.narrate,
            Stage::Render => &self.render,
            Stage::Publish => &self.publish,
        }
    }
}

/// Behaviour of the fake collaborators, keyed by entity-name substrings.
#[derive(Default)]
pub(crate) struct Script {
    pub calls: Calls,
    failures: Vec<(Stage, String)>,
    soft_misses: Vec<String>,
    metrics: Option<StockMetrics>,
    /// Raw documents the acquirer "downloads" (file names).
    documents: Vec<String>,
    /// Bundles the acquirer leaves in the download directory.
    bundles: Vec<String>,
}

impl Script {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail(mut self, stage: Stage, entity: &str) -> Self {
        self.failures.push((stage, entity.to_string()));
        self
    }

    pub(crate) fn soft_miss(mut self, entity: &str) -> Self {
        self.soft_misses.push(entity.to_string());
        self
    }

    pub(crate) fn with_metrics(mut self) -> Self {
        self.metrics = Some(StockMetrics {
            code: Some("1234".into()),
            per: "12.5".into(),
            pbr: "1.10".into(),
            ..Default::default()
        });
        self
    }

    pub(crate) fn acquirable(mut self, file_name: &str) -> Self {
        self.documents.push(file_name.to_string());
        self
    }

    pub(crate) fn bundled(mut self, file_name: &str) -> Self {
        self.bundles.push(file_name.to_string());
        self
    }

    pub(crate) fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn enter(&self, stage: Stage, subject: &str) -> Result<()> {
        self.calls.counter(stage).fetch_add(1, Ordering::SeqCst);
        if self
            .failures
            .iter()
            .any(|(s, entity)| *s == stage && subject.contains(entity.as_str()))
        {
            let message = match stage {
                Stage::Narrate => "synthesis failed",
                Stage::Publish => "quota exceeded",
                _ => "collaborator raised",
            };
            return Err(FilingcastError::stage(stage.as_str(), message));
        }
        Ok(())
    }
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|e| FilingcastError::io(path, e))
}

/// One double implementing every stage port.
struct Fake(Arc<Script>);

#[async_trait]
impl Acquirer for Fake {
    async fn acquire(&self, request: &AcquireRequest) -> Result<Vec<PathBuf>> {
        let subject = request.entity.clone().unwrap_or_default();
        self.0.enter(Stage::Acquire, &subject)?;

        let mut written = Vec::new();
        for name in &self.0.documents {
            if request.entity.as_ref().is_some_and(|e| !name.starts_with(e.as_str())) {
                continue;
            }
            if request.limit.is_some_and(|limit| written.len() >= limit) {
                break;
            }
            let path = request.dest_dir.join(name);
            write(&path, "<p>filing</p>")?;
            written.push(path);
        }
        for name in &self.0.bundles {
            if request.entity.as_ref().is_some_and(|e| !name.starts_with(e.as_str())) {
                continue;
            }
            std::fs::create_dir_all(&request.download_dir)
                .map_err(|e| FilingcastError::io(&request.download_dir, e))?;
            let path = request.download_dir.join(name);
            write_bundle(&path, "XBRLData/Attachment/tse-qcedjpfr-qualitative.htm");
            written.push(path);
        }
        Ok(written)
    }
}

#[async_trait]
impl Extractor for Fake {
    async fn extract(&self, document: &Path) -> Result<String> {
        let subject = document.to_string_lossy();
        self.0.enter(Stage::Extract, &subject)?;
        if self.0.soft_misses.iter().any(|e| subject.contains(e.as_str())) {
            return Ok(String::new());
        }
        Ok(SECTION_TEXT.to_string())
    }
}

#[async_trait]
impl Narrator for Fake {
    async fn narrate(&self, request: &NarrateRequest) -> Result<NarrationOutput> {
        self.0.enter(Stage::Narrate, &request.text_path.to_string_lossy())?;
        write(&request.output, "audio")?;
        Ok(NarrationOutput {
            duration: Some(Duration::from_secs(4)),
        })
    }
}

#[async_trait]
impl Renderer for Fake {
    async fn render(&self, request: &RenderRequest) -> Result<()> {
        self.0.enter(Stage::Render, &request.entity_name)?;
        write(&request.output, "video")
    }
}

#[async_trait]
impl Publisher for Fake {
    async fn publish(&self, request: &PublishRequest) -> Result<String> {
        self.0.enter(Stage::Publish, request.item_key.as_str())?;
        Ok(format!("content-{}", request.item_key))
    }
}

#[async_trait]
impl MetricsSource for Fake {
    async fn metrics(&self, _entity_name: &str) -> Option<StockMetrics> {
        self.0.calls.metrics.fetch_add(1, Ordering::SeqCst);
        self.0.metrics.clone()
    }
}

pub(crate) fn stage_set(script: &Arc<Script>) -> StageSet {
    StageSet {
        acquirer: Box::new(Fake(script.clone())),
        extractor: Box::new(Fake(script.clone())),
        narrator: Box::new(Fake(script.clone())),
        renderer: Box::new(Fake(script.clone())),
        publisher: Box::new(Fake(script.clone())),
        metrics: Box::new(Fake(script.clone())),
    }
}

pub(crate) fn processor_with(
    dir: &Path,
    script: &Arc<Script>,
    mut settings: ProcessorSettings,
) -> ItemProcessor {
    if settings.download_dir.as_os_str().is_empty() {
        settings.download_dir = dir.join("downloads");
    }
    let paths = ArtifactPaths::new(dir.join("processed"), SuffixConfig::default());
    ItemProcessor::new(stage_set(script), paths, settings)
}

pub(crate) fn processor(dir: &Path, script: &Arc<Script>) -> ItemProcessor {
    processor_with(dir, script, ProcessorSettings::default())
}

/// Write a raw document named `{key}_{raw suffix}` and return its item.
pub(crate) fn raw_item(paths: &ArtifactPaths, key: &str) -> Item {
    std::fs::create_dir_all(paths.dir()).unwrap();
    let name = format!("{key}_{}", paths.suffix(ArtifactKind::RawDocument));
    std::fs::write(paths.dir().join(&name), "<p>filing</p>").unwrap();
    paths
        .item_from_file_name(&name, ArtifactKind::RawDocument)
        .unwrap()
}

/// Write a one-member zip bundle at `path`.
pub(crate) fn write_bundle(path: &Path, member: &str) {
    let mut writer = ZipWriter::new(std::fs::File::create(path).unwrap());
    writer.start_file(member, SimpleFileOptions::default()).unwrap();
    writer.write_all(b"<p>filing</p>").unwrap();
    writer.finish().unwrap();
}
