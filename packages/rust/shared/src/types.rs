//! Core domain types for the filing-to-video pipeline.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FilingcastError;

/// Date layout of the date token embedded in artifact file names.
pub const DATE_TOKEN_FORMAT: &str = "%Y%m%d";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one batch run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ItemKey / Item
// ---------------------------------------------------------------------------

/// Canonical per-item identifier: `entity` or `entity_YYYYMMDD`.
///
/// Every artifact of an item is named `{item_key}_{suffix}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(String);

impl ItemKey {
    pub fn new(entity_name: &str, publication_date: Option<NaiveDate>) -> Self {
        match publication_date {
            Some(date) => Self(format!("{entity_name}_{}", date.format(DATE_TOKEN_FORMAT))),
            None => Self(entity_name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One unit of work: a discovered source document and its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub key: ItemKey,
    pub entity_name: String,
    pub publication_date: Option<NaiveDate>,
    pub source_document_path: PathBuf,
}

impl Item {
    pub fn new(
        entity_name: impl Into<String>,
        publication_date: Option<NaiveDate>,
        source_document_path: impl Into<PathBuf>,
    ) -> Self {
        let entity_name = entity_name.into();
        Self {
            key: ItemKey::new(&entity_name, publication_date),
            entity_name,
            publication_date,
            source_document_path: source_document_path.into(),
        }
    }

    /// Date token (`YYYYMMDD`) of this item, if it carries a date.
    pub fn date_token(&self) -> Option<String> {
        self.publication_date
            .map(|d| d.format(DATE_TOKEN_FORMAT).to_string())
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// The five pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Acquire,
    Extract,
    Narrate,
    Render,
    Publish,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Acquire,
        Stage::Extract,
        Stage::Narrate,
        Stage::Render,
        Stage::Publish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acquire => "acquire",
            Self::Extract => "extract",
            Self::Narrate => "narrate",
            Self::Render => "render",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = FilingcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FilingcastError::validation(format!("unknown stage '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// Visibility requested from the publishing service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = FilingcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "unlisted" => Ok(Self::Unlisted),
            "private" => Ok(Self::Private),
            other => Err(FilingcastError::validation(format!(
                "unknown visibility '{other}': expected public, unlisted or private"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// StockMetrics
// ---------------------------------------------------------------------------

/// Financial metrics for one listed company.
///
/// Values are kept as displayed by the source (e.g. `"25.3"`, `"---"`,
/// `"1.2兆円"`) so presentation never reformats them. PER and PBR are always
/// present; every other metric is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub per: String,
    pub pbr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_margin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}
