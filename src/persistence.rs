//! Persistence sink seam and a fire-and-forget background writer.

use anyhow::{Result, anyhow};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Receives `(chapter_id, offset)` writes from the reading engine.
pub trait PositionSink: Send {
    fn persist_position(&self, chapter_id: &str, offset: usize) -> Result<()>;
}

struct PersistRequest {
    chapter_id: String,
    offset: usize,
}

/// Runs an inner sink on a dedicated thread.
///
/// `persist_position` only enqueues, so the caller never waits on I/O. Errors
/// from the inner sink are logged and dropped. Shutting down (explicitly or on
/// drop) closes the queue and joins the worker, so every write issued before
/// teardown completes.
pub struct BackgroundSink {
    tx: Option<mpsc::Sender<PersistRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundSink {
    pub fn spawn<S>(inner: S) -> Result<Self>
    where
        S: PositionSink + 'static,
    {
        let (tx, rx) = mpsc::channel::<PersistRequest>();
        let worker = thread::Builder::new()
            .name("position-sink".to_string())
            .spawn(move || {
                for request in rx {
                    if let Err(err) = inner.persist_position(&request.chapter_id, request.offset) {
                        warn!(
                            chapter_id = %request.chapter_id,
                            offset = request.offset,
                            "Failed to persist reading position: {err:#}"
                        );
                    }
                }
                debug!("Position sink worker exiting");
            })?;
        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Drain outstanding writes and stop the worker. Idempotent.
    pub fn shutdown(&mut self) {
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Position sink worker panicked");
            }
        }
    }
}

impl PositionSink for BackgroundSink {
    fn persist_position(&self, chapter_id: &str, offset: usize) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| anyhow!("position sink already shut down"))?;
        tx.send(PersistRequest {
            chapter_id: chapter_id.to_string(),
            offset,
        })
        .map_err(|_| anyhow!("position sink worker is gone"))
    }
}

impl Drop for BackgroundSink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// In-memory sink; clones share the recorded writes.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    writes: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<(String, usize)> {
        self.writes
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_default()
    }
}

impl PositionSink for MemorySink {
    fn persist_position(&self, chapter_id: &str, offset: usize) -> Result<()> {
        let mut writes = self
            .writes
            .lock()
            .map_err(|_| anyhow!("memory sink lock poisoned"))?;
        writes.push((chapter_id.to_string(), offset));
        Ok(())
    }
}
