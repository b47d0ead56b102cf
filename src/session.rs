//! Chapter session: the single owner of all per-chapter reading state.
//!
//! A session is created by loading a chapter and lives until the reader
//! leaves it. It wires the paragraph store, search, highlight navigation,
//! progress tracking and speech playback to their external collaborators.

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::highlight::{HighlightNavigator, HighlightSpan, NavigationSignal};
use crate::paragraphs::{self, Paragraph};
use crate::persistence::PositionSink;
use crate::progress::{ProgressTracker, ReadingPosition};
use crate::search::{self, SearchMatch};
use crate::source::{ContentSource, LoadedChapter};
use crate::speech::{
    self, PlaybackSignal, SpeechBackend, SpeechChunker, SpeechEvent, SpeechEventSender,
    SpeechSession,
};
use anyhow::Result;
use serde::Serialize;
use std::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeechPlaybackState {
    #[default]
    Idle,
    Playing,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressView {
    pub last_persisted: Option<ReadingPosition>,
    pub last_seen_offset: Option<usize>,
    pub pending: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeechView {
    pub state: SpeechPlaybackState,
    pub generation: u64,
    pub chunk_count: usize,
    pub active_chunk: Option<usize>,
    pub active_paragraph: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReaderSnapshot {
    pub chapter_id: String,
    pub paragraph_count: usize,
    pub search_query: String,
    pub search_match_count: usize,
    pub selected_search_match: Option<usize>,
    pub highlights: Vec<HighlightSpan>,
    pub progress: ProgressView,
    pub speech: SpeechView,
}

#[derive(Debug, Clone)]
pub enum SessionCommand {
    GetSnapshot,
    SearchSetQuery { query: String },
    SearchNext,
    SearchPrev,
    PositionChanged { offset: usize },
    ProgressTick,
    ProgressFlush,
    SpeechStart,
    SpeechStop,
    SpeechDrainEvents,
}

impl SessionCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetSnapshot => "reader_get_snapshot",
            Self::SearchSetQuery { .. } => "reader_search_set_query",
            Self::SearchNext => "reader_search_next",
            Self::SearchPrev => "reader_search_prev",
            Self::PositionChanged { .. } => "reader_position_changed",
            Self::ProgressTick => "reader_progress_tick",
            Self::ProgressFlush => "reader_progress_flush",
            Self::SpeechStart => "reader_speech_start",
            Self::SpeechStop => "reader_speech_stop",
            Self::SpeechDrainEvents => "reader_speech_drain_events",
        }
    }
}

/// User-visible outcome of a command, if it produced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SessionSignal {
    Navigation { signal: NavigationSignal },
    Playback { signal: PlaybackSignal },
}

#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub action: &'static str,
    pub signal: Option<SessionSignal>,
    pub snapshot: ReaderSnapshot,
}

pub struct ChapterSession {
    chapter_id: String,
    raw_text: String,
    paragraphs: Vec<Paragraph>,
    search_query: String,
    navigator: HighlightNavigator,
    progress: ProgressTracker,
    flush_interval_ms: u64,
    last_tick_ms: u64,
    chunker: SpeechChunker,
    speech: Option<SpeechSession>,
    speech_generation: u64,
    speech_events_tx: SpeechEventSender,
    speech_events_rx: mpsc::Receiver<SpeechEvent>,
    sink: Box<dyn PositionSink>,
    backend: Box<dyn SpeechBackend>,
    clock: Box<dyn Clock>,
    closed: bool,
}

impl ChapterSession {
    /// Load `chapter_id` from `source` and build a session around it.
    pub fn open(
        chapter_id: &str,
        source: &dyn ContentSource,
        config: &EngineConfig,
        sink: Box<dyn PositionSink>,
        backend: Box<dyn SpeechBackend>,
        clock: Box<dyn Clock>,
    ) -> Result<Self> {
        let loaded = source.load_chapter(chapter_id)?;
        Ok(Self::from_loaded(
            chapter_id, loaded, config, sink, backend, clock,
        ))
    }

    pub fn from_loaded(
        chapter_id: &str,
        loaded: LoadedChapter,
        config: &EngineConfig,
        sink: Box<dyn PositionSink>,
        backend: Box<dyn SpeechBackend>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let paragraphs = paragraphs::build(&loaded.text);
        let opened_at = clock.now_ms();
        let progress =
            ProgressTracker::seeded(loaded.saved_offset, opened_at, config.debounce_interval_ms);
        let chunker =
            SpeechChunker::with_window_floor(config.max_chunk_length, config.sentence_window_floor);
        let (speech_events_tx, speech_events_rx) = speech::event_channel();
        info!(
            chapter_id,
            paragraphs = paragraphs.len(),
            saved_offset = loaded.saved_offset,
            "Opened chapter session"
        );

        Self {
            chapter_id: chapter_id.to_string(),
            raw_text: loaded.text,
            paragraphs,
            search_query: String::new(),
            navigator: HighlightNavigator::default(),
            progress,
            flush_interval_ms: config.flush_interval_ms,
            last_tick_ms: opened_at,
            chunker,
            speech: None,
            speech_generation: 0,
            speech_events_tx,
            speech_events_rx,
            sink,
            backend,
            clock,
            closed: false,
        }
    }

    pub fn chapter_id(&self) -> &str {
        &self.chapter_id
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Offset the chapter was opened at (or last persisted).
    pub fn resume_offset(&self) -> Option<usize> {
        self.progress.last_forwarded().map(|position| position.offset)
    }

    // Search and highlight navigation.

    /// Run a fresh search; the cursor lands on the first match. Returns the
    /// number of matches.
    pub fn search(&mut self, query: &str) -> usize {
        self.search_query = query.to_string();
        let matches = search::search(&self.paragraphs, query);
        let count = matches.len();
        self.navigator.set_matches(matches);
        info!(query, matches = count, "Updated search results");
        count
    }

    pub fn search_next(&mut self) -> NavigationSignal {
        let signal = self.navigator.advance();
        debug!(?signal, "Search next");
        signal
    }

    pub fn search_prev(&mut self) -> NavigationSignal {
        let signal = self.navigator.retreat();
        debug!(?signal, "Search previous");
        signal
    }

    pub fn current_match(&self) -> Option<&SearchMatch> {
        self.navigator.current()
    }

    pub fn navigator(&self) -> &HighlightNavigator {
        &self.navigator
    }

    pub fn highlight_spans(&self) -> Vec<HighlightSpan> {
        self.navigator.spans()
    }

    // Reading progress.

    /// Scroll/position callback. Returns true if the position was forwarded
    /// to the persistence sink.
    pub fn on_position_changed(&mut self, offset: usize) -> bool {
        let now = self.clock.now_ms();
        let forwarded = self.progress.on_position_changed(offset, now);
        self.forward_position(forwarded)
    }

    /// Host timer entry point; cheap to call every frame. Once per
    /// `flush_interval_ms` it runs [`ChapterSession::poll_progress`].
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now_ms();
        if now.saturating_sub(self.last_tick_ms) < self.flush_interval_ms {
            return false;
        }
        self.last_tick_ms = now;
        self.poll_progress()
    }

    /// Forwards a pending position once the debounce window has elapsed.
    pub fn poll_progress(&mut self) -> bool {
        let now = self.clock.now_ms();
        let forwarded = self.progress.poll(now);
        self.forward_position(forwarded)
    }

    /// Forward the latest position regardless of debounce.
    pub fn flush_progress(&mut self) -> bool {
        let now = self.clock.now_ms();
        let forwarded = self.progress.flush(now);
        self.forward_position(forwarded)
    }

    fn forward_position(&self, position: Option<ReadingPosition>) -> bool {
        let Some(position) = position else {
            return false;
        };
        if let Err(err) = self
            .sink
            .persist_position(&self.chapter_id, position.offset)
        {
            warn!(
                chapter_id = %self.chapter_id,
                offset = position.offset,
                "Failed to hand off reading position: {err:#}"
            );
        } else {
            debug!(
                chapter_id = %self.chapter_id,
                offset = position.offset,
                "Forwarded reading position"
            );
        }
        true
    }

    // Speech playback.

    /// Chunk the chapter and queue it on the backend, replacing any previous
    /// speech session. The backend is always stopped first.
    ///
    /// Returns a signal only when playback fails to start.
    pub fn start_speech(&mut self) -> Option<PlaybackSignal> {
        self.backend.stop();
        if let Some(previous) = self.speech.as_mut() {
            if previous.is_playing() {
                info!(
                    generation = previous.generation(),
                    "Superseding active speech session"
                );
            }
            previous.stop();
        }

        self.speech_generation = self.speech_generation.wrapping_add(1);
        let generation = self.speech_generation;
        let chunks = self.chunker.chunk(&self.raw_text);
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let session = SpeechSession::new(generation, chunks);
        let playing = session.is_playing();
        self.speech = Some(session);

        if !playing {
            info!(generation, "Nothing to speak in chapter");
            return None;
        }
        info!(
            generation,
            chunks = texts.len(),
            max_chunk_length = self.chunker.max_chunk_length(),
            sentence_window_floor = self.chunker.sentence_window_floor(),
            "Starting speech playback"
        );
        if let Err(err) = self
            .backend
            .enqueue(generation, texts, self.speech_events_tx.clone())
        {
            warn!(generation, "Speech backend rejected chunks: {err:#}");
            self.backend.stop();
            return self.speech.as_mut().and_then(|s| s.on_chunk_error(0));
        }
        None
    }

    /// Stop playback on user request. No playback signal is emitted.
    pub fn stop_speech(&mut self) {
        if let Some(session) = self.speech.as_mut() {
            if session.is_playing() {
                info!(generation = session.generation(), "Stopping speech playback");
                self.backend.stop();
            }
            session.stop();
        }
    }

    /// Sender for backends that report completions from their own thread.
    pub fn speech_events(&self) -> SpeechEventSender {
        self.speech_events_tx.clone()
    }

    /// Process every queued backend report in arrival order.
    ///
    /// Each generation ends with at most one terminal signal and stale
    /// generations are dropped, so the last signal is the only one.
    pub fn drain_speech_events(&mut self) -> Option<PlaybackSignal> {
        let mut outcome = None;
        while let Ok(event) = self.speech_events_rx.try_recv() {
            if let Some(signal) = self.handle_speech_event(event) {
                outcome = Some(signal);
            }
        }
        outcome
    }

    /// Apply one backend report. Reports from superseded sessions are dropped.
    pub fn handle_speech_event(&mut self, event: SpeechEvent) -> Option<PlaybackSignal> {
        if event.generation() != self.speech_generation {
            debug!(
                ?event,
                current = self.speech_generation,
                "Ignoring stale speech event"
            );
            return None;
        }
        match event {
            SpeechEvent::ChunkFinished { index, .. } => self.on_chunk_finished(index),
            SpeechEvent::ChunkError { index, .. } => self.on_chunk_error(index),
        }
    }

    /// Chunk `index` of the current session finished playing.
    pub fn on_chunk_finished(&mut self, index: usize) -> Option<PlaybackSignal> {
        self.speech.as_mut()?.on_chunk_finished(index)
    }

    /// Chunk `index` of the current session failed; the backend is stopped so
    /// nothing after it plays.
    pub fn on_chunk_error(&mut self, index: usize) -> Option<PlaybackSignal> {
        let signal = self.speech.as_mut()?.on_chunk_error(index);
        if signal.is_some() {
            self.backend.stop();
        }
        signal
    }

    pub fn speech(&self) -> Option<&SpeechSession> {
        self.speech.as_ref()
    }

    pub fn is_speaking(&self) -> bool {
        self.speech.as_ref().is_some_and(SpeechSession::is_playing)
    }

    /// Paragraph the active speech chunk starts in, for follow-along scrolling.
    pub fn active_speech_paragraph(&self) -> Option<usize> {
        let chunk = self.speech.as_ref()?.active_chunk()?;
        paragraphs::paragraph_at_offset(&self.paragraphs, chunk.start_offset)
    }

    // Presentation.

    pub fn snapshot(&self) -> ReaderSnapshot {
        let speech = match &self.speech {
            Some(session) => SpeechView {
                state: if session.is_playing() {
                    SpeechPlaybackState::Playing
                } else {
                    SpeechPlaybackState::Idle
                },
                generation: session.generation(),
                chunk_count: session.chunks().len(),
                active_chunk: session.active_index(),
                active_paragraph: self.active_speech_paragraph(),
            },
            None => SpeechView {
                state: SpeechPlaybackState::Idle,
                generation: self.speech_generation,
                chunk_count: 0,
                active_chunk: None,
                active_paragraph: None,
            },
        };
        ReaderSnapshot {
            chapter_id: self.chapter_id.clone(),
            paragraph_count: self.paragraphs.len(),
            search_query: self.search_query.clone(),
            search_match_count: self.navigator.matches().len(),
            selected_search_match: self.navigator.current_index(),
            highlights: self.highlight_spans(),
            progress: ProgressView {
                last_persisted: self.progress.last_forwarded(),
                last_seen_offset: self.progress.last_seen_offset(),
                pending: self.progress.has_pending(),
            },
            speech,
        }
    }

    pub fn apply_command(&mut self, command: SessionCommand) -> SessionEvent {
        let action = command.action();
        let navigation = |signal: NavigationSignal| Some(SessionSignal::Navigation { signal });
        let playback = |signal: Option<PlaybackSignal>| {
            signal.map(|signal| SessionSignal::Playback { signal })
        };
        let signal = match command {
            SessionCommand::GetSnapshot => None,
            SessionCommand::SearchSetQuery { query } => {
                self.search(&query);
                None
            }
            SessionCommand::SearchNext => navigation(self.search_next()),
            SessionCommand::SearchPrev => navigation(self.search_prev()),
            SessionCommand::PositionChanged { offset } => {
                self.on_position_changed(offset);
                None
            }
            SessionCommand::ProgressTick => {
                self.tick();
                None
            }
            SessionCommand::ProgressFlush => {
                self.flush_progress();
                None
            }
            SessionCommand::SpeechStart => playback(self.start_speech()),
            SessionCommand::SpeechStop => {
                self.stop_speech();
                None
            }
            SessionCommand::SpeechDrainEvents => playback(self.drain_speech_events()),
        };
        SessionEvent {
            action,
            signal,
            snapshot: self.snapshot(),
        }
    }

    /// Leave the chapter: stop speech and persist the final position.
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.stop_speech();
        let flushed = self.flush_progress();
        info!(
            chapter_id = %self.chapter_id,
            flushed,
            "Closed chapter session"
        );
    }
}

impl Drop for ChapterSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::persistence::{BackgroundSink, MemorySink};
    use crate::source::StaticContentSource;
    use anyhow::anyhow;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct BackendLog {
        stops: usize,
        enqueued: Vec<(u64, Vec<String>)>,
    }

    /// Backend that records calls and leaves completion reporting to the test.
    #[derive(Clone, Default)]
    struct ScriptedBackend {
        log: Arc<Mutex<BackendLog>>,
        reject: bool,
    }

    impl SpeechBackend for ScriptedBackend {
        fn stop(&mut self) {
            self.log.lock().unwrap().stops += 1;
        }

        fn enqueue(
            &mut self,
            generation: u64,
            texts: Vec<String>,
            _events: SpeechEventSender,
        ) -> Result<()> {
            if self.reject {
                return Err(anyhow!("audio device busy"));
            }
            self.log.lock().unwrap().enqueued.push((generation, texts));
            Ok(())
        }
    }

    const CHAPTER: &str = "The cat sat.\n\nThe dog ran! Then the bird sang?\nthe end";

    fn config() -> EngineConfig {
        EngineConfig {
            max_chunk_length: 20,
            sentence_window_floor: 0,
            debounce_interval_ms: 1000,
            ..EngineConfig::default()
        }
    }

    fn open_with(
        backend: ScriptedBackend,
        sink: MemorySink,
        clock: ManualClock,
        saved_offset: usize,
    ) -> ChapterSession {
        let source = StaticContentSource::new().with_chapter("ch-1", CHAPTER, saved_offset);
        ChapterSession::open(
            "ch-1",
            &source,
            &config(),
            Box::new(sink),
            Box::new(backend),
            Box::new(clock),
        )
        .unwrap()
    }

    fn open_default() -> (ChapterSession, ScriptedBackend, MemorySink, ManualClock) {
        let backend = ScriptedBackend::default();
        let sink = MemorySink::new();
        let clock = ManualClock::new(10_000);
        let session = open_with(backend.clone(), sink.clone(), clock.clone(), 0);
        (session, backend, sink, clock)
    }

    #[test]
    fn open_builds_paragraphs_and_seeds_progress() {
        let (session, _, sink, _) = open_default();
        let texts: Vec<&str> = session.paragraphs().iter().map(|p| p.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["The cat sat.", "The dog ran! Then the bird sang?", "the end"]
        );
        assert_eq!(session.resume_offset(), Some(0));
        assert!(sink.writes().is_empty());
    }

    #[test]
    fn search_walks_matches_and_reports_wraparound() {
        let (mut session, ..) = open_default();
        // "The", then "The", "Then" and "the", then "the".
        assert_eq!(session.search("the"), 5);
        assert_eq!(session.current_match().map(|m| m.paragraph_index), Some(0));

        for _ in 0..4 {
            assert!(matches!(session.search_next(), NavigationSignal::Moved { .. }));
        }
        let signal = session.search_next();
        assert!(matches!(signal, NavigationSignal::Wrapped { .. }));
        assert_eq!(signal.found().map(|m| m.paragraph_index), Some(0));

        let spans = session.highlight_spans();
        assert_eq!(spans.len(), 5);
        assert_eq!(spans.iter().filter(|span| span.is_current).count(), 1);
    }

    #[test]
    fn research_resets_cursor_and_empty_query_clears() {
        let (mut session, ..) = open_default();
        session.search("the");
        session.search_next();
        session.search("THE");
        assert_eq!(session.navigator().current_index(), Some(0));

        assert_eq!(session.search("   "), 0);
        assert_eq!(session.search_next(), NavigationSignal::NoResults);
        assert!(session.highlight_spans().is_empty());
    }

    #[test]
    fn debounced_positions_flush_once_with_latest_offset() {
        let (mut session, _, sink, clock) = open_default();
        assert!(!session.on_position_changed(10));
        clock.advance(100);
        assert!(!session.on_position_changed(20));
        assert!(sink.writes().is_empty());

        assert!(session.flush_progress());
        assert_eq!(sink.writes(), vec![("ch-1".to_string(), 20)]);
        assert!(!session.flush_progress());
    }

    #[test]
    fn tick_forwards_pending_position_after_window() {
        let (mut session, _, sink, clock) = open_default();
        session.on_position_changed(10);
        clock.advance(999);
        assert!(!session.poll_progress());
        clock.advance(1);
        assert!(session.poll_progress());
        assert_eq!(sink.writes(), vec![("ch-1".to_string(), 10)]);
    }

    #[test]
    fn tick_polls_once_per_flush_interval() {
        let (mut session, _, sink, clock) = open_default();
        session.on_position_changed(10);
        clock.advance(1500);
        assert!(!session.tick());
        assert!(sink.writes().is_empty());

        clock.advance(3500);
        assert!(session.tick());
        assert_eq!(sink.writes(), vec![("ch-1".to_string(), 10)]);

        session.on_position_changed(30);
        clock.advance(1000);
        assert!(!session.tick());
        clock.advance(4000);
        assert!(session.tick());
        assert_eq!(sink.writes().len(), 2);
    }

    #[test]
    fn progress_tick_command_waits_for_flush_interval() {
        let (mut session, _, sink, clock) = open_default();
        session.apply_command(SessionCommand::PositionChanged { offset: 12 });
        clock.advance(2000);
        session.apply_command(SessionCommand::ProgressTick);
        assert!(sink.writes().is_empty());
        clock.advance(3000);
        let event = session.apply_command(SessionCommand::ProgressTick);
        assert_eq!(event.action, "reader_progress_tick");
        assert_eq!(sink.writes(), vec![("ch-1".to_string(), 12)]);
    }

    #[test]
    fn close_flushes_final_position_through_background_sink() {
        let memory = MemorySink::new();
        let clock = ManualClock::new(0);
        let source = StaticContentSource::new().with_chapter("ch-1", CHAPTER, 3);
        let mut session = ChapterSession::open(
            "ch-1",
            &source,
            &config(),
            Box::new(BackgroundSink::spawn(memory.clone()).unwrap()),
            Box::new(ScriptedBackend::default()),
            Box::new(clock.clone()),
        )
        .unwrap();
        session.on_position_changed(3);
        session.on_position_changed(44);
        session.close();
        assert_eq!(memory.writes(), vec![("ch-1".to_string(), 44)]);
    }

    #[test]
    fn dropping_session_also_flushes() {
        let (mut session, _, sink, _) = open_default();
        session.on_position_changed(5);
        drop(session);
        assert_eq!(sink.writes(), vec![("ch-1".to_string(), 5)]);
    }

    #[test]
    fn speech_plays_to_completion_once() {
        let (mut session, backend, ..) = open_default();
        assert_eq!(session.start_speech(), None);
        let chunk_count = {
            let log = backend.log.lock().unwrap();
            assert_eq!(log.stops, 1);
            assert_eq!(log.enqueued.len(), 1);
            let rebuilt: String = log.enqueued[0].1.concat();
            assert_eq!(rebuilt, CHAPTER);
            log.enqueued[0].1.len()
        };
        assert!(session.is_speaking());
        assert_eq!(session.active_speech_paragraph(), Some(0));

        let events = session.speech_events();
        for index in 0..chunk_count {
            events.chunk_finished(1, index);
        }
        assert_eq!(session.drain_speech_events(), Some(PlaybackSignal::Finished));
        assert!(!session.is_speaking());
        assert_eq!(session.drain_speech_events(), None);
    }

    #[test]
    fn chunk_error_fails_playback_and_stops_backend() {
        let (mut session, backend, ..) = open_default();
        session.start_speech();
        assert_eq!(session.on_chunk_finished(0), None);
        assert_eq!(
            session.on_chunk_error(1),
            Some(PlaybackSignal::Failed { index: 1 })
        );
        assert!(!session.is_speaking());
        assert_eq!(backend.log.lock().unwrap().stops, 2);
        assert_eq!(session.on_chunk_finished(2), None);
    }

    #[test]
    fn restarting_speech_stops_previous_and_ignores_stale_events() {
        let (mut session, backend, ..) = open_default();
        session.start_speech();
        let events = session.speech_events();
        events.chunk_finished(1, 0);
        session.start_speech();
        events.chunk_finished(1, 1);
        assert_eq!(session.drain_speech_events(), None);

        let speech = session.speech().unwrap();
        assert_eq!(speech.generation(), 2);
        assert_eq!(speech.active_index(), Some(0));
        let log = backend.log.lock().unwrap();
        assert_eq!(log.stops, 2);
        assert_eq!(log.enqueued.len(), 2);
    }

    #[test]
    fn rejected_enqueue_surfaces_failure() {
        let backend = ScriptedBackend {
            reject: true,
            ..ScriptedBackend::default()
        };
        let mut session = open_with(backend, MemorySink::new(), ManualClock::new(0), 0);
        assert_eq!(
            session.start_speech(),
            Some(PlaybackSignal::Failed { index: 0 })
        );
        assert!(!session.is_speaking());
    }

    #[test]
    fn empty_chapter_has_nothing_to_search_or_speak() {
        let source = StaticContentSource::new().with_chapter("blank", "\n\n", 0);
        let backend = ScriptedBackend::default();
        let mut session = ChapterSession::open(
            "blank",
            &source,
            &config(),
            Box::new(MemorySink::new()),
            Box::new(backend.clone()),
            Box::new(ManualClock::new(0)),
        )
        .unwrap();
        assert!(session.paragraphs().is_empty());
        assert_eq!(session.search("x"), 0);
        // Two newlines are still input, so one chunk is queued.
        assert_eq!(session.start_speech(), None);
        assert_eq!(session.speech().map(|s| s.chunks().len()), Some(1));

        let source = StaticContentSource::new().with_chapter("empty", "", 0);
        let mut session = ChapterSession::open(
            "empty",
            &source,
            &config(),
            Box::new(MemorySink::new()),
            Box::new(ScriptedBackend::default()),
            Box::new(ManualClock::new(0)),
        )
        .unwrap();
        assert_eq!(session.start_speech(), None);
        assert!(!session.is_speaking());
    }

    #[test]
    fn command_dispatch_emits_action_signal_and_snapshot() {
        let (mut session, ..) = open_default();
        let event = session.apply_command(SessionCommand::SearchSetQuery {
            query: "dog".to_string(),
        });
        assert_eq!(event.action, "reader_search_set_query");
        assert_eq!(event.signal, None);
        assert_eq!(event.snapshot.search_match_count, 1);
        assert_eq!(event.snapshot.selected_search_match, Some(0));

        let event = session.apply_command(SessionCommand::SearchNext);
        assert_eq!(event.action, "reader_search_next");
        assert!(matches!(
            event.signal,
            Some(SessionSignal::Navigation {
                signal: NavigationSignal::Wrapped { .. }
            })
        ));

        let event = session.apply_command(SessionCommand::PositionChanged { offset: 9 });
        assert!(event.snapshot.progress.pending);
        let event = session.apply_command(SessionCommand::ProgressFlush);
        assert!(!event.snapshot.progress.pending);
        assert_eq!(
            event.snapshot.progress.last_persisted.map(|p| p.offset),
            Some(9)
        );

        let event = session.apply_command(SessionCommand::SpeechStart);
        assert_eq!(event.snapshot.speech.state, SpeechPlaybackState::Playing);
        let event = session.apply_command(SessionCommand::SpeechStop);
        assert_eq!(event.snapshot.speech.state, SpeechPlaybackState::Idle);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let (mut session, ..) = open_default();
        session.search("the");
        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(json["chapter_id"], "ch-1");
        assert_eq!(json["search_match_count"], 5);
        assert_eq!(json["highlights"][0]["is_current"], true);
        assert_eq!(json["speech"]["state"], "idle");
    }
}
