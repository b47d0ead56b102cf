//! Speech backend seam.
//!
//! The engine hands a backend the ordered chunk texts of one session, tagged
//! with the session's generation. The backend reports back through a
//! [`SpeechEventSender`] from whatever thread it plays on; the session drains
//! those events on its own thread, in arrival order.

use anyhow::Result;
use serde::Serialize;
use std::sync::mpsc;
use tracing::{debug, info};

/// Completion report for one chunk of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpeechEvent {
    ChunkFinished { generation: u64, index: usize },
    ChunkError { generation: u64, index: usize },
}

impl SpeechEvent {
    pub fn generation(&self) -> u64 {
        match self {
            SpeechEvent::ChunkFinished { generation, .. }
            | SpeechEvent::ChunkError { generation, .. } => *generation,
        }
    }
}

/// Cloneable, non-blocking handle a backend uses to report chunk outcomes.
#[derive(Debug, Clone)]
pub struct SpeechEventSender {
    tx: mpsc::Sender<SpeechEvent>,
}

impl SpeechEventSender {
    pub fn chunk_finished(&self, generation: u64, index: usize) {
        self.send(SpeechEvent::ChunkFinished { generation, index });
    }

    pub fn chunk_error(&self, generation: u64, index: usize) {
        self.send(SpeechEvent::ChunkError { generation, index });
    }

    fn send(&self, event: SpeechEvent) {
        // The owning session may already be closed; late reports are moot.
        if self.tx.send(event).is_err() {
            debug!(?event, "Dropping speech event for closed session");
        }
    }
}

pub(crate) fn event_channel() -> (SpeechEventSender, mpsc::Receiver<SpeechEvent>) {
    let (tx, rx) = mpsc::channel();
    (SpeechEventSender { tx }, rx)
}

/// Sequential speech player.
pub trait SpeechBackend: Send {
    /// Halt current playback and drop anything still queued.
    fn stop(&mut self);

    /// Queue `texts` for playback in order. Each text is one chunk; its
    /// position in `texts` is the chunk index to report back.
    fn enqueue(
        &mut self,
        generation: u64,
        texts: Vec<String>,
        events: SpeechEventSender,
    ) -> Result<()>;
}

/// Backend that "speaks" by logging each chunk and reporting it finished
/// straight away.
#[derive(Debug, Default)]
pub struct LoggingSpeechBackend {
    spoken: usize,
}

impl LoggingSpeechBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> usize {
        self.spoken
    }
}

impl SpeechBackend for LoggingSpeechBackend {
    fn stop(&mut self) {
        debug!("Logging backend stop requested");
    }

    fn enqueue(
        &mut self,
        generation: u64,
        texts: Vec<String>,
        events: SpeechEventSender,
    ) -> Result<()> {
        for (index, text) in texts.iter().enumerate() {
            info!(
                generation,
                index,
                chars = text.chars().count(),
                "Speaking chunk"
            );
            self.spoken += 1;
            events.chunk_finished(generation, index);
        }
        Ok(())
    }
}
