//! Stage ports.
//!
//! Each pipeline stage is an external collaborator behind a trait. The item
//! processor only sees these signatures; adapters live in [`crate::external`]
//! (subprocess commands) and here (in-process extraction, metrics lookup).

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

use filingcast_quote::QuoteClient;
use filingcast_section::{SectionRules, extract_section};
use filingcast_shared::{FilingcastError, ItemKey, Result, StockMetrics, Visibility};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// What to download. `None` fields mean "no restriction".
#[derive(Debug, Clone, Default)]
pub struct AcquireRequest {
    pub entity: Option<String>,
    pub date: Option<NaiveDate>,
    pub limit: Option<usize>,
    /// Where raw documents must end up, named `{item_key}_{raw_suffix}`.
    pub dest_dir: PathBuf,
    /// Where `*.zip` bundles may be left; they are unpacked into `dest_dir`.
    pub download_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct NarrateRequest {
    pub text_path: PathBuf,
    pub text: String,
    pub output: PathBuf,
}

/// What the narrator reports back.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NarrationOutput {
    /// Length of the produced audio, when the narrator knows it.
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub item_key: ItemKey,
    pub entity_name: String,
    pub publication_date: Option<NaiveDate>,
    pub audio: PathBuf,
    pub text_path: PathBuf,
    pub text: String,
    pub metrics: Option<StockMetrics>,
    pub subtitle: Option<PathBuf>,
    pub output: PathBuf,
    pub thumbnail: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub item_key: ItemKey,
    pub video: PathBuf,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub visibility: Visibility,
    pub subtitle: Option<PathBuf>,
    pub thumbnail: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Fetches raw documents into the output directory.
#[async_trait]
pub trait Acquirer: Send + Sync {
    async fn acquire(&self, request: &AcquireRequest) -> Result<Vec<PathBuf>>;
}

/// Raw document → section text. An empty string is a soft miss, not an error.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, document: &Path) -> Result<String>;
}

/// Text → audio file at `request.output`.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, request: &NarrateRequest) -> Result<NarrationOutput>;
}

/// Audio (+ text, metrics) → video at `request.output`, optionally a thumbnail.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> Result<()>;
}

/// Video → remote content identifier.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, request: &PublishRequest) -> Result<String>;
}

/// Market metrics for an entity. Lookup problems are absorbed as `None`.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn metrics(&self, entity_name: &str) -> Option<StockMetrics>;
}

/// One adapter per stage.
pub struct StageSet {
    pub acquirer: Box<dyn Acquirer>,
    pub extractor: Box<dyn Extractor>,
    pub narrator: Box<dyn Narrator>,
    pub renderer: Box<dyn Renderer>,
    pub publisher: Box<dyn Publisher>,
    pub metrics: Box<dyn MetricsSource>,
}

// ---------------------------------------------------------------------------
// In-process adapters
// ---------------------------------------------------------------------------

/// Extracts the configured section from an HTML filing.
#[derive(Debug, Clone, Default)]
pub struct HtmlSectionExtractor {
    rules: SectionRules,
}

impl HtmlSectionExtractor {
    pub fn new(rules: SectionRules) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl Extractor for HtmlSectionExtractor {
    async fn extract(&self, document: &Path) -> Result<String> {
        let bytes = tokio::fs::read(document)
            .await
            .map_err(|e| FilingcastError::io(document, e))?;
        let section = extract_section(&String::from_utf8_lossy(&bytes), &self.rules)?;
        if section.is_empty() {
            warn!(
                path = %document.display(),
                start_found = section.start_marker.is_some(),
                "target section not found"
            );
        }
        Ok(section.text)
    }
}

#[async_trait]
impl MetricsSource for QuoteClient {
    async fn metrics(&self, entity_name: &str) -> Option<StockMetrics> {
        match self.fetch(entity_name).await {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!(entity = entity_name, error = %e, "metrics lookup failed");
                None
            }
        }
    }
}

/// Metrics source used when lookups are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetrics;

#[async_trait]
impl MetricsSource for NoMetrics {
    async fn metrics(&self, _entity_name: &str) -> Option<StockMetrics> {
        None
    }
}
