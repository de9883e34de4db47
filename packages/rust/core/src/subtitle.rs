//! SRT subtitles derived from the narration text.
//!
//! Text is split at sentence ends into chunks of bounded length, and the
//! narration's duration is spread evenly across the chunks.

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use filingcast_shared::{FilingcastError, Result};

/// Maximum characters per subtitle chunk.
pub const SUBTITLE_MAX_CHARS: usize = 40;

static SENTENCE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[。\n]+").expect("valid regex"));

/// Group sentences into chunks of at most `max_chars` characters.
///
/// A single sentence longer than the limit becomes its own chunk.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut sentences: Vec<(&str, &str)> = Vec::new();
    let mut last = 0;
    for m in SENTENCE_END_RE.find_iter(text) {
        sentences.push((&text[last..m.start()], m.as_str()));
        last = m.end();
    }
    sentences.push((&text[last..], ""));

    let mut chunks = Vec::new();
    let mut current = String::new();

    for (sentence, delimiter) in sentences {
        if sentence.trim().is_empty() {
            continue;
        }
        let full = format!("{sentence}{delimiter}");

        if current.chars().count() + full.chars().count() <= max_chars {
            current.push_str(&full);
        } else {
            push_trimmed(&mut chunks, &current);
            current = full;
        }
    }
    push_trimmed(&mut chunks, &current);

    chunks
}

fn push_trimmed(chunks: &mut Vec<String>, chunk: &str) {
    let chunk = chunk.trim();
    if !chunk.is_empty() {
        chunks.push(chunk.to_string());
    }
}

/// `HH:MM:SS,mmm`. Sub-millisecond fractions are truncated, never rounded up.
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let whole = seconds.trunc() as u64;
    let millis = (seconds.fract() * 1000.0) as u64;
    let (hours, minutes, secs) = (whole / 3600, whole % 3600 / 60, whole % 60);
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

/// Build an SRT document, or `None` when the text yields no chunks.
pub fn build_srt(text: &str, duration: Duration, max_chars: usize) -> Option<String> {
    let chunks = split_into_chunks(text, max_chars);
    if chunks.is_empty() {
        return None;
    }

    let per_chunk = duration.as_secs_f64() / chunks.len() as f64;
    let entries: Vec<String> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let start = format_timestamp(i as f64 * per_chunk);
            let end = format_timestamp((i + 1) as f64 * per_chunk);
            format!("{}\n{start} --> {end}\n{chunk}\n", i + 1)
        })
        .collect();

    Some(entries.join("\n"))
}

/// Write subtitles for `text` to `path`. Returns whether a file was written.
pub async fn write_srt(path: &Path, text: &str, duration: Duration) -> Result<bool> {
    match build_srt(text, duration, SUBTITLE_MAX_CHARS) {
        Some(srt) => {
            tokio::fs::write(path, srt)
                .await
                .map_err(|e| FilingcastError::io(path, e))?;
            Ok(true)
        }
        None => Ok(false),
    }
}
