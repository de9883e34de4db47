//! Character-width folding applied before marker matching.

/// Map full-width ASCII variants (U+FF01..=U+FF5E) and the ideographic space
/// to their half-width forms. Every other character passes through unchanged.
pub fn fold_width(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            '\u{3000}' => ' ',
            _ => c,
        })
        .collect()
}
