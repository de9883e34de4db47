//! Marker rules driving the section state machine.

use serde::{Deserialize, Serialize};

use filingcast_shared::ExtractionConfig;

use crate::normalize::fold_width;

/// Ordered marker lists and filters for one target section.
///
/// Markers are substrings, tried in listed order; the first hit wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRules {
    pub start_markers: Vec<String>,
    pub end_markers: Vec<String>,
    /// Minimum trimmed paragraph length, counted in characters.
    pub min_paragraph_chars: usize,
    /// Fold full-width ASCII before matching. Emitted text is never rewritten.
    pub normalize_width: bool,
    pub heading_tags: Vec<String>,
    pub paragraph_tags: Vec<String>,
}

impl Default for SectionRules {
    fn default() -> Self {
        Self::from(&ExtractionConfig::default())
    }
}

impl From<&ExtractionConfig> for SectionRules {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            start_markers: config.start_markers.clone(),
            end_markers: config.end_markers.clone(),
            min_paragraph_chars: config.min_paragraph_chars,
            normalize_width: config.normalize_width,
            heading_tags: config.heading_tags.clone(),
            paragraph_tags: config.paragraph_tags.clone(),
        }
    }
}

/// A marker list prepared for matching.
#[derive(Debug, Clone)]
pub(crate) struct MarkerSet {
    /// (original marker, form used for matching)
    markers: Vec<(String, String)>,
    fold: bool,
}

impl MarkerSet {
    pub(crate) fn new(markers: &[String], fold: bool) -> Self {
        let markers = markers
            .iter()
            .filter(|m| !m.is_empty())
            .map(|m| {
                let key = if fold { fold_width(m) } else { m.clone() };
                (m.clone(), key)
            })
            .collect();
        Self { markers, fold }
    }

    /// Return the first marker contained in `text`.
    pub(crate) fn first_match(&self, text: &str) -> Option<&str> {
        let folded;
        let haystack = if self.fold {
            folded = fold_width(text);
            folded.as_str()
        } else {
            text
        };

        self.markers
            .iter()
            .find(|(_, key)| haystack.contains(key.as_str()))
            .map(|(original, _)| original.as_str())
    }
}
