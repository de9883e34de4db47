//! Flatten an HTML filing into an ordered list of text blocks.

use scraper::{Html, Selector};

use filingcast_shared::{FilingcastError, Result};

use crate::rules::SectionRules;

/// Structural role of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading,
    Paragraph,
}

/// One heading or paragraph element with its flattened text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Element tag name (`h3`, `p`, ...).
    pub tag: String,
    pub text: String,
}

impl Block {
    pub fn heading(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Heading,
            tag: "h3".into(),
            text: text.into(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            tag: "p".into(),
            text: text.into(),
        }
    }
}

/// Parse `html` into blocks in document order.
///
/// Each element's text nodes are trimmed and concatenated. Elements whose
/// text is empty (including a lone ideographic space) are dropped.
pub fn parse_blocks(html: &str, rules: &SectionRules) -> Result<Vec<Block>> {
    let tags: Vec<&str> = rules
        .heading_tags
        .iter()
        .chain(rules.paragraph_tags.iter())
        .map(String::as_str)
        .collect();

    if tags.is_empty() {
        return Err(FilingcastError::config(
            "extraction rules name no heading or paragraph tags",
        ));
    }

    let selector_src = tags.join(", ");
    let selector = Selector::parse(&selector_src).map_err(|e| {
        FilingcastError::parse(format!("invalid block selector '{selector_src}': {e}"))
    })?;

    let doc = Html::parse_document(html);
    let mut blocks = Vec::new();

    for el in doc.select(&selector) {
        let tag = el.value().name().to_ascii_lowercase();
        let text: String = el.text().map(str::trim).collect();
        if text.is_empty() {
            continue;
        }

        let kind = if rules.heading_tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            BlockKind::Heading
        } else {
            BlockKind::Paragraph
        };

        blocks.push(Block { kind, tag, text });
    }

    Ok(blocks)
}
