//! File-backed store for per-chapter reading positions.
//!
//! Entries live under the cache directory in a folder named after a hash of
//! the chapter id, so arbitrary ids never hit filesystem naming issues. Each
//! entry is a tiny TOML file with a single `offset` field.

use crate::persistence::PositionSink;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FilePositionStore {
    root: PathBuf,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct PositionEntry {
    offset: usize,
}

impl FilePositionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn hash_dir(&self, chapter_id: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(chapter_id.as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        self.root.join(hash)
    }

    fn position_path(&self, chapter_id: &str) -> PathBuf {
        self.hash_dir(chapter_id).join("position.toml")
    }

    /// Saved offset for a chapter, if one was ever written and is readable.
    pub fn load_position(&self, chapter_id: &str) -> Option<usize> {
        let data = fs::read_to_string(self.position_path(chapter_id)).ok()?;
        let entry: PositionEntry = toml::from_str(&data).ok()?;
        Some(entry.offset)
    }

    pub fn save_position(&self, chapter_id: &str, offset: usize) -> Result<()> {
        let path = self.position_path(chapter_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating position dir {}", parent.display()))?;
        }
        let contents = toml::to_string(&PositionEntry { offset })?;
        fs::write(&path, contents)
            .with_context(|| format!("Writing position file {}", path.display()))?;
        debug!(chapter_id, offset, path = %path.display(), "Saved reading position");
        Ok(())
    }
}

impl PositionSink for FilePositionStore {
    fn persist_position(&self, chapter_id: &str, offset: usize) -> Result<()> {
        self.save_position(chapter_id, offset)
    }
}
