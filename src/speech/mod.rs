//! Speech playback: chunking plus per-session completion tracking.

mod backend;
mod chunker;

pub use backend::{LoggingSpeechBackend, SpeechBackend, SpeechEvent, SpeechEventSender};
pub(crate) use backend::event_channel;
pub use chunker::{DEFAULT_SENTENCE_WINDOW_FLOOR, SpeechChunk, SpeechChunker, chunk};

use serde::Serialize;
use tracing::{debug, info, warn};

/// Terminal outcome of a speech session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackSignal {
    Finished,
    Failed { index: usize },
}

/// Playback state for one chunk sequence.
///
/// `active_index` is the chunk expected to be playing; it is `None` once the
/// session is no longer playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechSession {
    generation: u64,
    chunks: Vec<SpeechChunk>,
    active_index: Option<usize>,
    is_playing: bool,
}

impl SpeechSession {
    pub fn new(generation: u64, chunks: Vec<SpeechChunk>) -> Self {
        let is_playing = !chunks.is_empty();
        Self {
            generation,
            active_index: is_playing.then_some(0),
            chunks,
            is_playing,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn chunks(&self) -> &[SpeechChunk] {
        &self.chunks
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn active_chunk(&self) -> Option<&SpeechChunk> {
        self.active_index.and_then(|idx| self.chunks.get(idx))
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Record that chunk `index` finished playing.
    ///
    /// Emits [`PlaybackSignal::Finished`] exactly once, when the last chunk
    /// finishes.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or behind the active chunk; the
    /// backend must report completions in increasing order.
    pub fn on_chunk_finished(&mut self, index: usize) -> Option<PlaybackSignal> {
        if !self.is_playing {
            debug!(
                generation = self.generation,
                index, "Ignoring completion for ended speech session"
            );
            return None;
        }
        self.check_report(index, "finished");

        if index + 1 == self.chunks.len() {
            self.is_playing = false;
            self.active_index = None;
            info!(
                generation = self.generation,
                chunks = self.chunks.len(),
                "Speech playback finished"
            );
            Some(PlaybackSignal::Finished)
        } else {
            self.active_index = Some(index + 1);
            None
        }
    }

    /// Record a backend failure on chunk `index`; playback ends immediately.
    ///
    /// # Panics
    ///
    /// Same contract as [`SpeechSession::on_chunk_finished`].
    pub fn on_chunk_error(&mut self, index: usize) -> Option<PlaybackSignal> {
        if !self.is_playing {
            debug!(
                generation = self.generation,
                index, "Ignoring error for ended speech session"
            );
            return None;
        }
        self.check_report(index, "failed");
        self.is_playing = false;
        self.active_index = None;
        warn!(generation = self.generation, index, "Speech playback failed");
        Some(PlaybackSignal::Failed { index })
    }

    fn check_report(&self, index: usize, outcome: &str) {
        let active = self.active_index.unwrap_or(0);
        assert!(
            index < self.chunks.len(),
            "chunk {index} {outcome} but session has {} chunks",
            self.chunks.len()
        );
        assert!(
            index >= active,
            "chunk {index} {outcome} out of order; expected chunk {active} or later"
        );
    }

    /// End the session without a signal (user stop or replacement).
    pub fn stop(&mut self) {
        self.is_playing = false;
        self.active_index = None;
    }
}
