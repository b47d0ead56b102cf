//! Paragraph splitting.
//!
//! Chapter text arrives as one string; the reader works on the non-blank,
//! newline-delimited segments of it. Every other component addresses text by
//! paragraph index, so the indices here are the shared coordinate system.

use serde::Serialize;

/// A non-blank line of chapter text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    /// Position in the owning sequence, starting at 0.
    pub index: usize,
    pub text: String,
    /// Character offset of the first character within the raw chapter text.
    pub start_offset: usize,
}

impl Paragraph {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Split raw chapter text into indexed paragraphs.
///
/// Blank segments (empty or whitespace only) are dropped rather than emitted
/// as empty paragraphs. A trailing `\r` is stripped so CRLF input behaves like
/// LF input.
pub fn build(raw_text: &str) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut offset = 0usize;

    for segment in raw_text.split('\n') {
        let segment_chars = segment.chars().count();
        if !segment.trim().is_empty() {
            let text = segment.strip_suffix('\r').unwrap_or(segment);
            paragraphs.push(Paragraph {
                index: paragraphs.len(),
                text: text.to_string(),
                start_offset: offset,
            });
        }
        // +1 for the newline consumed by the split.
        offset += segment_chars + 1;
    }

    paragraphs
}

/// Index of the paragraph containing `char_offset`, or the nearest one before
/// it when the offset falls on a dropped blank line.
pub fn paragraph_at_offset(paragraphs: &[Paragraph], char_offset: usize) -> Option<usize> {
    let after = paragraphs.partition_point(|para| para.start_offset <= char_offset);
    match after {
        0 => paragraphs.first().map(|para| para.index),
        n => Some(paragraphs[n - 1].index),
    }
}
