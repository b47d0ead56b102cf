//! Reading-position tracking with deduplication and debounce.
//!
//! The presentation layer reports every scroll event. Only a bounded rate of
//! them should reach the persistence sink, and the most recent one must never
//! be lost when the chapter is closed.

use serde::Serialize;

/// The last position handed to the persistence sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadingPosition {
    pub offset: usize,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressTracker {
    debounce_interval_ms: u64,
    last_forwarded: Option<ReadingPosition>,
    last_seen_offset: Option<usize>,
}

impl ProgressTracker {
    pub fn new(debounce_interval_ms: u64) -> Self {
        Self {
            debounce_interval_ms,
            last_forwarded: None,
            last_seen_offset: None,
        }
    }

    /// Tracker that treats `saved_offset` as already persisted at `now_ms`.
    ///
    /// Restoring the saved position is then never written back, and scroll
    /// events right after opening the chapter fall inside the debounce window.
    pub fn seeded(saved_offset: usize, now_ms: u64, debounce_interval_ms: u64) -> Self {
        Self {
            debounce_interval_ms,
            last_forwarded: Some(ReadingPosition {
                offset: saved_offset,
                timestamp_ms: now_ms,
            }),
            last_seen_offset: Some(saved_offset),
        }
    }

    pub fn last_forwarded(&self) -> Option<ReadingPosition> {
        self.last_forwarded
    }

    pub fn last_seen_offset(&self) -> Option<usize> {
        self.last_seen_offset
    }

    /// True when the latest seen offset has not been forwarded yet.
    pub fn has_pending(&self) -> bool {
        match (self.last_seen_offset, self.last_forwarded) {
            (Some(seen), Some(forwarded)) => seen != forwarded.offset,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Record a position event. Returns the position to persist, if any.
    pub fn on_position_changed(&mut self, offset: usize, now_ms: u64) -> Option<ReadingPosition> {
        self.last_seen_offset = Some(offset);
        match self.last_forwarded {
            Some(last) if last.offset == offset => None,
            Some(last) if !self.window_elapsed(last, now_ms) => None,
            _ => Some(self.forward(offset, now_ms)),
        }
    }

    /// Forward the pending offset if the debounce window has elapsed since the
    /// last write. Meant for a periodic tick.
    pub fn poll(&mut self, now_ms: u64) -> Option<ReadingPosition> {
        if !self.has_pending() {
            return None;
        }
        match self.last_forwarded {
            Some(last) if !self.window_elapsed(last, now_ms) => None,
            _ => self.flush(now_ms),
        }
    }

    /// Forward the pending offset regardless of the debounce window.
    pub fn flush(&mut self, now_ms: u64) -> Option<ReadingPosition> {
        if !self.has_pending() {
            return None;
        }
        let offset = self.last_seen_offset?;
        Some(self.forward(offset, now_ms))
    }

    fn window_elapsed(&self, last: ReadingPosition, now_ms: u64) -> bool {
        now_ms.saturating_sub(last.timestamp_ms) >= self.debounce_interval_ms
    }

    fn forward(&mut self, offset: usize, now_ms: u64) -> ReadingPosition {
        let position = ReadingPosition {
            offset,
            timestamp_ms: now_ms,
        };
        self.last_forwarded = Some(position);
        position
    }
}
