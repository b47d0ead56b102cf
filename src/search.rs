//! In-chapter full-text search.
//!
//! Queries are matched literally and case-insensitively against each paragraph.
//! Matches never overlap: scanning resumes where the previous match ended.

use crate::paragraphs::Paragraph;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::{debug, warn};

/// A located occurrence of the query, in character offsets within one paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SearchMatch {
    pub paragraph_index: usize,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Scan `paragraphs` for `query`.
///
/// Results come out ordered by `(paragraph_index, start_offset)` because the
/// scan itself walks paragraphs in order and each paragraph left to right.
pub fn search(paragraphs: &[Paragraph], query: &str) -> Vec<SearchMatch> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let Some(pattern) = literal_pattern(query) else {
        return Vec::new();
    };

    let mut matches = Vec::new();
    for para in paragraphs {
        collect_paragraph_matches(&pattern, para, &mut matches);
    }
    debug!(query, matches = matches.len(), "Search completed");
    matches
}

fn literal_pattern(query: &str) -> Option<Regex> {
    match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => Some(pattern),
        Err(err) => {
            // Escaped literals only fail on size limits.
            warn!(query_len = query.len(), "Search query rejected: {err}");
            None
        }
    }
}

fn collect_paragraph_matches(pattern: &Regex, para: &Paragraph, out: &mut Vec<SearchMatch>) {
    // Byte offsets from the regex are converted to char offsets incrementally,
    // since `find_iter` yields them in increasing order.
    let text = para.text.as_str();
    let mut byte_cursor = 0usize;
    let mut char_cursor = 0usize;

    for found in pattern.find_iter(text) {
        if found.start() == found.end() {
            continue;
        }
        char_cursor += text[byte_cursor..found.start()].chars().count();
        let start_offset = char_cursor;
        char_cursor += found.as_str().chars().count();
        byte_cursor = found.end();

        out.push(SearchMatch {
            paragraph_index: para.index,
            start_offset,
            end_offset: char_cursor,
        });
    }
}
