//! Heuristic section extraction for disclosure filings.
//!
//! A filing is flattened into an ordered list of heading/paragraph blocks,
//! then a two-state machine (seeking, collecting) returns the paragraph text
//! of the one section bounded by configurable start and end markers.

mod document;
mod extractor;
mod normalize;
mod rules;

use tracing::{debug, instrument};

use filingcast_shared::Result;

pub use document::{Block, BlockKind, parse_blocks};
pub use extractor::{PARAGRAPH_SEPARATOR, SectionExtractor, SectionText};
pub use normalize::fold_width;
pub use rules::SectionRules;

/// Parse `html` and extract the target section.
///
/// A missing section is an empty [`SectionText`], not an error.
#[instrument(skip_all, fields(bytes = html.len()))]
pub fn extract_section(html: &str, rules: &SectionRules) -> Result<SectionText> {
    let blocks = parse_blocks(html, rules)?;
    debug!(blocks = blocks.len(), "document flattened");
    Ok(SectionExtractor::new(rules.clone()).extract(&blocks))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILING: &str = r#"<html><body>
<h2>1. 経営成績等の概況</h2>
<h3>(1) 当期の経営成績の概況</h3>
<p>当連結会計年度の売上高は前年同期比12.4%増となりました。</p>
<p>　</p>
<p>以上</p>
<p>営業利益は半導体需要の回復により大幅に増加しました。</p>
<h3>(2) 当期の財政状態の概況</h3>
<p>総資産は前期末に比べ増加しました。</p>
</body></html>"#;

    #[test]
    fn extracts_section_from_html_string() {
        let section = extract_section(FILING, &SectionRules::default()).unwrap();
        // "経営成績等の概況" on the h2 opens the section; the h3 heading inside
        // it is not body text, and "以上" falls under the length threshold.
        assert_eq!(
            section.text,
            "当連結会計年度の売上高は前年同期比12.4%増となりました。\n\n営業利益は半導体需要の回復により大幅に増加しました。"
        );
        assert_eq!(section.start_marker.as_deref(), Some("経営成績等の概況"));
        assert_eq!(section.end_marker.as_deref(), Some("財政状態の概況"));
    }
}
