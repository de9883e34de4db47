//! The seeking/collecting state machine.

use tracing::debug;

use crate::document::{Block, BlockKind};
use crate::rules::{MarkerSet, SectionRules};

/// Separator placed between collected paragraphs.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Result of one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionText {
    /// Paragraphs joined by [`PARAGRAPH_SEPARATOR`]; empty on a miss.
    pub text: String,
    pub paragraphs: Vec<String>,
    /// Marker that opened the section, if any matched.
    pub start_marker: Option<String>,
    /// Marker that closed it; `None` when the document ran out first.
    pub end_marker: Option<String>,
}

impl SectionText {
    /// True when nothing was collected (no start marker, or an empty section).
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchState {
    Seeking,
    Collecting,
}

/// Locates one named section in a block sequence.
#[derive(Debug, Clone)]
pub struct SectionExtractor {
    start: MarkerSet,
    end: MarkerSet,
    min_chars: usize,
}

impl SectionExtractor {
    pub fn new(rules: SectionRules) -> Self {
        Self {
            start: MarkerSet::new(&rules.start_markers, rules.normalize_width),
            end: MarkerSet::new(&rules.end_markers, rules.normalize_width),
            min_chars: rules.min_paragraph_chars,
        }
    }

    pub fn extract(&self, blocks: &[Block]) -> SectionText {
        let mut state = MatchState::Seeking;
        let mut out = SectionText::default();

        for block in blocks {
            match state {
                MatchState::Seeking => {
                    if let Some(marker) = self.start.first_match(&block.text) {
                        debug!(marker, "section start found");
                        out.start_marker = Some(marker.to_string());
                        state = MatchState::Collecting;
                    }
                }
                MatchState::Collecting => {
                    // End markers apply to paragraphs too: some filings repeat
                    // the next heading inside a <p>.
                    if let Some(marker) = self.end.first_match(&block.text) {
                        debug!(marker, "section end found");
                        out.end_marker = Some(marker.to_string());
                        break;
                    }

                    if block.kind == BlockKind::Paragraph {
                        let text = block.text.trim();
                        if text.chars().count() >= self.min_chars {
                            out.paragraphs.push(text.to_string());
                        }
                    }
                }
            }
        }

        out.text = out.paragraphs.join(PARAGRAPH_SEPARATOR);
        out
    }
}
