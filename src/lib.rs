//! Reading engine for a chapter-reader screen.
//!
//! - [`paragraphs`] splits chapter text into indexed paragraphs.
//! - [`search`] and [`highlight`] provide in-chapter search with a
//!   wraparound result cursor.
//! - [`progress`] debounces reading-position writes.
//! - [`speech`] chunks text for a sequential speech backend and tracks
//!   completion.
//! - [`session::ChapterSession`] ties them together for one open chapter.

pub mod cache;
pub mod clock;
pub mod config;
pub mod highlight;
pub mod paragraphs;
pub mod persistence;
pub mod progress;
pub mod search;
pub mod session;
pub mod source;
pub mod speech;

pub use highlight::{HighlightNavigator, HighlightSpan, NavigationSignal};
pub use paragraphs::Paragraph;
pub use progress::{ProgressTracker, ReadingPosition};
pub use search::SearchMatch;
pub use session::{ChapterSession, ReaderSnapshot, SessionCommand, SessionEvent, SessionSignal};
pub use speech::{PlaybackSignal, SpeechChunk, SpeechChunker, SpeechSession};
