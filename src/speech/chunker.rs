//! Sentence-aware chunking of chapter text for speech playback.
//!
//! Speech backends cap how much text a single utterance may carry, so the
//! chapter is cut into bounded chunks. Cuts prefer the end of a sentence
//! (`.`, `!` or `?` followed by whitespace) and fall back to a hard cut at the
//! length limit when no sentence end is close enough.

use serde::Serialize;

/// Default lower bound of the backward sentence-end scan, relative to the
/// start of the chunk.
pub const DEFAULT_SENTENCE_WINDOW_FLOOR: usize = 100;

/// A contiguous slice of the raw chapter text queued as one utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechChunk {
    pub index: usize,
    pub text: String,
    /// Character offset in the raw text, inclusive.
    pub start_offset: usize,
    /// Character offset in the raw text, exclusive.
    pub end_offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechChunker {
    max_chunk_length: usize,
    sentence_window_floor: usize,
}

impl SpeechChunker {
    pub fn new(max_chunk_length: usize) -> Self {
        Self::with_window_floor(max_chunk_length, DEFAULT_SENTENCE_WINDOW_FLOOR)
    }

    /// `sentence_window_floor` chars at the start of every chunk are never
    /// considered as a break point, which keeps chunks from becoming tiny.
    pub fn with_window_floor(max_chunk_length: usize, sentence_window_floor: usize) -> Self {
        Self {
            max_chunk_length: max_chunk_length.max(1),
            sentence_window_floor,
        }
    }

    pub fn max_chunk_length(&self) -> usize {
        self.max_chunk_length
    }

    pub fn sentence_window_floor(&self) -> usize {
        self.sentence_window_floor
    }

    pub fn chunk(&self, raw_text: &str) -> Vec<SpeechChunk> {
        let chars: Vec<char> = raw_text.chars().collect();
        let len = chars.len();
        let mut chunks = Vec::new();
        let mut cursor = 0usize;

        while cursor < len {
            let candidate_end = (cursor + self.max_chunk_length).min(len);
            let break_point = if candidate_end < len {
                self.sentence_break(&chars, cursor, candidate_end)
                    .unwrap_or(candidate_end)
            } else {
                candidate_end
            };

            chunks.push(SpeechChunk {
                index: chunks.len(),
                text: chars[cursor..break_point].iter().collect(),
                start_offset: cursor,
                end_offset: break_point,
            });
            cursor = break_point;
        }

        chunks
    }

    /// Nearest sentence end at or before `candidate_end - 1`, scanning no
    /// further back than `cursor + floor`. Returns the position just past the
    /// punctuation.
    fn sentence_break(&self, chars: &[char], cursor: usize, candidate_end: usize) -> Option<usize> {
        let lower = cursor + self.sentence_window_floor;
        if lower >= candidate_end {
            return None;
        }
        (lower..candidate_end).rev().find_map(|idx| {
            let ends_sentence = matches!(chars[idx], '.' | '!' | '?');
            let followed_by_space = chars.get(idx + 1).is_none_or(|next| next.is_whitespace());
            (ends_sentence && followed_by_space).then_some(idx + 1)
        })
    }
}

/// Chunk with the default window floor.
pub fn chunk(raw_text: &str, max_chunk_length: usize) -> Vec<SpeechChunk> {
    SpeechChunker::new(max_chunk_length).chunk(raw_text)
}
