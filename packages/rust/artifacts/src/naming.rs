//! Item keys and artifact paths.
//!
//! Source documents are named `{entity}_{YYYYMMDD}_{raw_suffix}`; the date
//! token is optional. Parsing is total: a name that does not follow the
//! convention yields its whole stem as the entity name and no date.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use filingcast_shared::{DATE_TOKEN_FORMAT, Item, ItemKey, Stage, SuffixConfig};

/// Separator between the item key and the suffix token.
const SEPARATOR: char = '_';

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

/// Every file kind the pipeline reads or writes for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    RawDocument,
    ExtractedText,
    Audio,
    Subtitle,
    Video,
    Thumbnail,
    PublishReceipt,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 7] = [
        ArtifactKind::RawDocument,
        ArtifactKind::ExtractedText,
        ArtifactKind::Audio,
        ArtifactKind::Subtitle,
        ArtifactKind::Video,
        ArtifactKind::Thumbnail,
        ArtifactKind::PublishReceipt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RawDocument => "raw_document",
            Self::ExtractedText => "extracted_text",
            Self::Audio => "audio",
            Self::Subtitle => "subtitle",
            Self::Video => "video",
            Self::Thumbnail => "thumbnail",
            Self::PublishReceipt => "publish_receipt",
        }
    }

    /// Suffix token for this kind under the given configuration.
    pub fn suffix<'a>(&self, suffixes: &'a SuffixConfig) -> &'a str {
        match self {
            Self::RawDocument => &suffixes.raw_document,
            Self::ExtractedText => &suffixes.extracted_text,
            Self::Audio => &suffixes.audio,
            Self::Subtitle => &suffixes.subtitle,
            Self::Video => &suffixes.video,
            Self::Thumbnail => &suffixes.thumbnail,
            Self::PublishReceipt => &suffixes.publish_receipt,
        }
    }

    /// Sub-directory of the archive root that receives this kind on reset.
    pub fn archive_dir_name(&self) -> &'static str {
        match self {
            Self::RawDocument => "html",
            Self::ExtractedText => "text",
            Self::Audio => "audio",
            Self::Subtitle => "subtitle",
            Self::Video => "movie",
            Self::Thumbnail => "thumbnail",
            Self::PublishReceipt => "receipt",
        }
    }

    /// Artifact whose existence marks `stage` as done.
    pub fn produced_by(stage: Stage) -> Self {
        match stage {
            Stage::Acquire => Self::RawDocument,
            Stage::Extract => Self::ExtractedText,
            Stage::Narrate => Self::Audio,
            Stage::Render => Self::Video,
            Stage::Publish => Self::PublishReceipt,
        }
    }

    /// Artifact a single-stage run of `stage` starts from.
    pub fn consumed_by(stage: Stage) -> Self {
        match stage {
            Stage::Acquire | Stage::Extract => Self::RawDocument,
            Stage::Narrate => Self::ExtractedText,
            Stage::Render => Self::Audio,
            Stage::Publish => Self::Video,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// File name parsing
// ---------------------------------------------------------------------------

/// Identity recovered from a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemName {
    pub entity_name: String,
    pub publication_date: Option<NaiveDate>,
    pub key: ItemKey,
}

/// Derive an item identity from `file_name`, which should end in `_{suffix}`.
///
/// The last `_`-separated token of the stem becomes the date when it is
/// exactly eight ASCII digits forming a valid calendar date; otherwise it
/// stays part of the entity name.
pub fn parse_source_filename(file_name: &str, suffix: &str) -> ItemName {
    let stem = file_name
        .strip_suffix(suffix)
        .and_then(|s| s.strip_suffix(SEPARATOR))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| plain_stem(file_name));

    let (entity, date) = match stem.rsplit_once(SEPARATOR) {
        Some((entity, token)) if !entity.is_empty() => match parse_date_token(token) {
            Some(date) => (entity, Some(date)),
            None => (stem, None),
        },
        _ => (stem, None),
    };

    ItemName {
        entity_name: entity.to_string(),
        publication_date: date,
        key: ItemKey::new(entity, date),
    }
}

/// Parse an eight-digit `YYYYMMDD` token.
pub fn parse_date_token(token: &str) -> Option<NaiveDate> {
    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(token, DATE_TOKEN_FORMAT).ok()
}

fn plain_stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

// ---------------------------------------------------------------------------
// ArtifactPaths
// ---------------------------------------------------------------------------

/// A file produced by one stage for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageArtifact {
    pub item_key: ItemKey,
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub exists: bool,
}

/// Canonical artifact locations under one output directory.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    dir: PathBuf,
    suffixes: SuffixConfig,
}

impl ArtifactPaths {
    pub fn new(dir: impl Into<PathBuf>, suffixes: SuffixConfig) -> Self {
        Self {
            dir: dir.into(),
            suffixes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn suffixes(&self) -> &SuffixConfig {
        &self.suffixes
    }

    pub fn suffix(&self, kind: ArtifactKind) -> &str {
        kind.suffix(&self.suffixes)
    }

    pub fn file_name(&self, key: &ItemKey, kind: ArtifactKind) -> String {
        format!("{key}{SEPARATOR}{}", self.suffix(kind))
    }

    /// `{dir}/{item_key}_{suffix}`
    pub fn path_for(&self, key: &ItemKey, kind: ArtifactKind) -> PathBuf {
        self.dir.join(self.file_name(key, kind))
    }

    pub fn exists(&self, key: &ItemKey, kind: ArtifactKind) -> bool {
        self.path_for(key, kind).exists()
    }

    pub fn artifact(&self, key: &ItemKey, kind: ArtifactKind) -> StageArtifact {
        let path = self.path_for(key, kind);
        let exists = path.exists();
        StageArtifact {
            item_key: key.clone(),
            kind,
            path,
            exists,
        }
    }

    /// Build an [`Item`] from a file of the given kind in this directory.
    ///
    /// Returns `None` when the name does not carry the kind's suffix.
    pub fn item_from_file_name(&self, file_name: &str, kind: ArtifactKind) -> Option<Item> {
        let suffix = self.suffix(kind);
        let marker = format!("{SEPARATOR}{suffix}");
        if !file_name.ends_with(&marker) || file_name.len() == marker.len() {
            return None;
        }

        let name = parse_source_filename(file_name, suffix);
        let raw = self.path_for(&name.key, ArtifactKind::RawDocument);
        Some(Item::new(name.entity_name, name.publication_date, raw))
    }
}
