//! Application configuration for Filingcast.
//!
//! User config lives at `~/.filingcast/filingcast.toml`.
//! CLI flags override config file values, which override defaults.
//! The schedule record is persisted separately (see `filingcast-core`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FilingcastError, Result};
use crate::types::Visibility;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "filingcast.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".filingcast";

// ---------------------------------------------------------------------------
// Config structs (matching filingcast.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    /// Artifact file-name suffix tokens.
    #[serde(default)]
    pub suffixes: SuffixConfig,

    /// Section marker rules.
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// External commands backing each collaborator stage.
    #[serde(default)]
    pub stages: StagesConfig,

    #[serde(default)]
    pub publish: PublishConfig,

    /// Market-data lookup.
    #[serde(default)]
    pub quote: QuoteConfig,

    #[serde(default)]
    pub batch: BatchConfig,
}

/// `[paths]` section. Relative paths resolve against the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Shared output directory holding every item's artifacts.
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,

    /// Scratch directory handed to the acquisition collaborator.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Root of the per-kind archive folders used by reset.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,

    /// Persisted schedule record.
    #[serde(default = "default_schedule_file")]
    pub schedule_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            processed_dir: default_processed_dir(),
            download_dir: default_download_dir(),
            archive_dir: default_archive_dir(),
            schedule_file: default_schedule_file(),
        }
    }
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("data/processed")
}
fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}
fn default_archive_dir() -> PathBuf {
    PathBuf::from("archive")
}
fn default_schedule_file() -> PathBuf {
    PathBuf::from("data/config/schedule.json")
}

/// `[suffixes]` section. Tokens follow the `{item_key}_` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixConfig {
    #[serde(default = "default_raw_suffix")]
    pub raw_document: String,
    #[serde(default = "default_text_suffix")]
    pub extracted_text: String,
    #[serde(default = "default_audio_suffix")]
    pub audio: String,
    #[serde(default = "default_subtitle_suffix")]
    pub subtitle: String,
    #[serde(default = "default_video_suffix")]
    pub video: String,
    #[serde(default = "default_thumbnail_suffix")]
    pub thumbnail: String,
    #[serde(default = "default_receipt_suffix")]
    pub publish_receipt: String,
}

impl Default for SuffixConfig {
    fn default() -> Self {
        Self {
            raw_document: default_raw_suffix(),
            extracted_text: default_text_suffix(),
            audio: default_audio_suffix(),
            subtitle: default_subtitle_suffix(),
            video: default_video_suffix(),
            thumbnail: default_thumbnail_suffix(),
            publish_receipt: default_receipt_suffix(),
        }
    }
}

fn default_raw_suffix() -> String {
    "qualitative.htm".into()
}
fn default_text_suffix() -> String {
    "extracted_text.txt".into()
}
fn default_audio_suffix() -> String {
    "output.mp3".into()
}
fn default_subtitle_suffix() -> String {
    "subtitle.srt".into()
}
fn default_video_suffix() -> String {
    "output.mp4".into()
}
fn default_thumbnail_suffix() -> String {
    "thumbnail.png".into()
}
fn default_receipt_suffix() -> String {
    "published.json".into()
}

/// `[extraction]` section: the data-driven section marker rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Start-of-section markers, tried in order.
    #[serde(default = "default_start_markers")]
    pub start_markers: Vec<String>,

    /// End-of-section markers, tried in order.
    #[serde(default = "default_end_markers")]
    pub end_markers: Vec<String>,

    /// Paragraphs shorter than this (in characters, after trimming) are dropped.
    #[serde(default = "default_min_paragraph_chars")]
    pub min_paragraph_chars: usize,

    /// Fold full-width ASCII variants before marker matching.
    #[serde(default)]
    pub normalize_width: bool,

    #[serde(default = "default_heading_tags")]
    pub heading_tags: Vec<String>,

    #[serde(default = "default_paragraph_tags")]
    pub paragraph_tags: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            start_markers: default_start_markers(),
            end_markers: default_end_markers(),
            min_paragraph_chars: default_min_paragraph_chars(),
            normalize_width: false,
            heading_tags: default_heading_tags(),
            paragraph_tags: default_paragraph_tags(),
        }
    }
}

fn default_start_markers() -> Vec<String> {
    [
        "経営成績の概況",
        "経営成績等の概況",
        "業績の概況",
        "Results of Operations",
        "Management Discussion of Results",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_end_markers() -> Vec<String> {
    ["財政状態の概況", "財政状態に関する", "Financial Position"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_min_paragraph_chars() -> usize {
    10
}
fn default_heading_tags() -> Vec<String> {
    ["h1", "h2", "h3", "h4", "h5", "h6"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_paragraph_tags() -> Vec<String> {
    vec!["p".into()]
}

/// An external program invoked for one stage.
///
/// Arguments may contain `{placeholder}` tokens substituted per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// `[stages]` section. An absent command means the stage is unavailable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquire: Option<CommandSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrate: Option<CommandSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render: Option<CommandSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<CommandSpec>,
}

/// `[publish]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Visibility for operator-driven runs.
    #[serde(default)]
    pub visibility: Visibility,

    /// Visibility for scheduled runs.
    #[serde(default = "default_auto_visibility")]
    pub auto_visibility: Visibility,

    /// Tags attached to every upload; entity tags are appended.
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,

    /// Publishing service category identifier.
    #[serde(default = "default_category_id")]
    pub category_id: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            visibility: Visibility::Public,
            auto_visibility: default_auto_visibility(),
            tags: default_tags(),
            category_id: default_category_id(),
        }
    }
}

fn default_auto_visibility() -> Visibility {
    Visibility::Private
}
fn default_tags() -> Vec<String> {
    ["決算", "IR", "決算短信", "企業分析"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_category_id() -> String {
    "27".into()
}

/// `[quote]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Search endpoint used to resolve a company name to a listing code.
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Base URL of the quote pages (`{base}/quote/{code}.T`).
    #[serde(default = "default_quote_base_url")]
    pub quote_base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause between the search and the quote request.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            search_url: default_search_url(),
            quote_base_url: default_quote_base_url(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_search_url() -> String {
    "https://search.yahoo.co.jp/search".into()
}
fn default_quote_base_url() -> String {
    "https://finance.yahoo.co.jp".into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_request_delay_ms() -> u64 {
    1000
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into()
}

/// `[batch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Item cap offered by the interactive prompt.
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Skip items whose metrics cannot be obtained.
    #[serde(default)]
    pub require_metrics: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            require_metrics: false,
        }
    }
}

fn default_limit() -> usize {
    50
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.filingcast/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| FilingcastError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.filingcast/filingcast.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| FilingcastError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        FilingcastError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file to `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| FilingcastError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| FilingcastError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| FilingcastError::io(path, e))?;
    tracing::info!(?path, "created default config file");
    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}
