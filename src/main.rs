//! Command-line driver for the chapter reading engine.
//!
//! Opens one chapter from the configured chapters directory, optionally
//! searches it and walks every match, speaks it through the logging backend
//! and prints the final reader snapshot as JSON.

use anyhow::{Context, Result, anyhow};
use chapter_reader::cache::FilePositionStore;
use chapter_reader::clock::SystemClock;
use chapter_reader::config::load_config;
use chapter_reader::persistence::BackgroundSink;
use chapter_reader::session::ChapterSession;
use chapter_reader::source::DirectoryContentSource;
use chapter_reader::speech::LoggingSpeechBackend;
use chapter_reader::{NavigationSignal, PlaybackSignal};
use std::env;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

struct Args {
    chapter_id: String,
    query: Option<String>,
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args()?;
    let config = load_config(Path::new("conf/config.toml"));
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        chapter_id = %args.chapter_id,
        chapters_dir = %config.chapters_dir,
        cache_dir = %config.cache_dir,
        max_chunk_length = config.max_chunk_length,
        debounce_interval_ms = config.debounce_interval_ms,
        "Starting chapter reader"
    );

    let positions = FilePositionStore::new(&config.cache_dir);
    let source = DirectoryContentSource::new(&config.chapters_dir, positions.clone());
    let sink = BackgroundSink::spawn(positions).context("Starting position sink")?;
    let mut session = ChapterSession::open(
        &args.chapter_id,
        &source,
        &config,
        Box::new(sink),
        Box::new(LoggingSpeechBackend::new()),
        Box::new(SystemClock::new()),
    )?;

    if let Some(query) = &args.query {
        walk_matches(&mut session, query);
    }

    if let Some(signal) = session.start_speech() {
        warn!(?signal, "Speech did not start");
    }
    match session.drain_speech_events() {
        Some(PlaybackSignal::Finished) => info!("Finished reading chapter aloud"),
        Some(PlaybackSignal::Failed { index }) => warn!(index, "Playback failed"),
        None => {}
    }
    let last_paragraph = session.paragraphs().last().map(|para| para.start_offset);
    if let Some(offset) = last_paragraph {
        session.on_position_changed(offset);
    }
    if session.tick() {
        info!("Periodic progress tick persisted position");
    }

    let snapshot = serde_json::to_string_pretty(&session.snapshot())?;
    println!("{snapshot}");
    session.close();
    Ok(())
}

fn walk_matches(session: &mut ChapterSession, query: &str) {
    let total = session.search(query);
    if total == 0 {
        info!(query, "No results");
        return;
    }
    for step in 0..total {
        let Some(found) = session.current_match().copied() else {
            break;
        };
        let Some(paragraph) = session.paragraphs().get(found.paragraph_index) else {
            break;
        };
        let paragraph_start = paragraph.start_offset;
        let excerpt: String = paragraph
            .text
            .chars()
            .skip(found.start_offset)
            .take(found.end_offset - found.start_offset)
            .collect();
        info!(
            step = step + 1,
            total,
            paragraph = found.paragraph_index,
            start = found.start_offset,
            %excerpt,
            "Search match"
        );
        session.on_position_changed(paragraph_start);
        if let NavigationSignal::Wrapped { .. } = session.search_next() {
            info!("Reached last match; wrapping to first");
        }
    }
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let chapter_id = args
        .next()
        .ok_or_else(|| anyhow!("Usage: chapter-reader <chapter-id> [query]"))?;
    let query = args.next();
    Ok(Args { chapter_id, query })
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    if env::var_os("RUST_LOG").is_some() {
        info!("RUST_LOG is set; keeping environment log filter");
        return;
    }
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
