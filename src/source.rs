//! Chapter content sources.

use crate::cache::FilePositionStore;
use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Raw chapter text plus the reading offset to resume from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedChapter {
    pub text: String,
    pub saved_offset: usize,
}

pub trait ContentSource {
    fn load_chapter(&self, chapter_id: &str) -> Result<LoadedChapter>;
}

/// Reads `<dir>/<chapter_id>.txt`, resuming from the position store.
#[derive(Debug, Clone)]
pub struct DirectoryContentSource {
    dir: PathBuf,
    positions: FilePositionStore,
}

impl DirectoryContentSource {
    pub fn new(dir: impl Into<PathBuf>, positions: FilePositionStore) -> Self {
        Self {
            dir: dir.into(),
            positions,
        }
    }

    pub fn chapter_path(&self, chapter_id: &str) -> Result<PathBuf> {
        // Ids name files directly under the chapter dir; no traversal.
        let valid = !chapter_id.is_empty()
            && Path::new(chapter_id).components().count() == 1
            && !chapter_id.contains(['/', '\\'])
            && chapter_id != ".."
            && chapter_id != ".";
        if !valid {
            bail!("Invalid chapter id: {chapter_id:?}");
        }
        Ok(self.dir.join(format!("{chapter_id}.txt")))
    }
}

impl ContentSource for DirectoryContentSource {
    fn load_chapter(&self, chapter_id: &str) -> Result<LoadedChapter> {
        let path = self.chapter_path(chapter_id)?;
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Reading chapter {}", path.display()))?;
        let saved_offset = self.positions.load_position(chapter_id).unwrap_or(0);
        info!(
            chapter_id,
            path = %path.display(),
            chars = text.chars().count(),
            saved_offset,
            "Loaded chapter from disk"
        );
        Ok(LoadedChapter { text, saved_offset })
    }
}

/// In-memory chapters, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct StaticContentSource {
    chapters: HashMap<String, LoadedChapter>,
}

impl StaticContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chapter(
        mut self,
        chapter_id: impl Into<String>,
        text: impl Into<String>,
        saved_offset: usize,
    ) -> Self {
        self.chapters.insert(
            chapter_id.into(),
            LoadedChapter {
                text: text.into(),
                saved_offset,
            },
        );
        self
    }
}

impl ContentSource for StaticContentSource {
    fn load_chapter(&self, chapter_id: &str) -> Result<LoadedChapter> {
        let chapter = self
            .chapters
            .get(chapter_id)
            .cloned()
            .with_context(|| format!("Unknown chapter: {chapter_id}"))?;
        debug!(chapter_id, "Loaded chapter from memory");
        Ok(chapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_source_resumes_from_saved_position() {
        let dir = tempfile::tempdir().unwrap();
        let chapters = dir.path().join("chapters");
        fs::create_dir_all(&chapters).unwrap();
        fs::write(chapters.join("ch-01.txt"), "Call me Ishmael.\n").unwrap();
        let positions = FilePositionStore::new(dir.path().join("cache"));
        let source = DirectoryContentSource::new(&chapters, positions.clone());

        let loaded = source.load_chapter("ch-01").unwrap();
        assert_eq!(loaded.text, "Call me Ishmael.\n");
        assert_eq!(loaded.saved_offset, 0);

        positions.save_position("ch-01", 77).unwrap();
        assert_eq!(source.load_chapter("ch-01").unwrap().saved_offset, 77);
    }

    #[test]
    fn directory_source_rejects_path_like_ids() {
        let source = DirectoryContentSource::new("/tmp", FilePositionStore::new("/tmp/cache"));
        assert!(source.chapter_path("../etc/passwd").is_err());
        assert!(source.chapter_path("a/b").is_err());
        assert!(source.chapter_path("").is_err());
        assert!(source.chapter_path("..").is_err());
        assert!(source.chapter_path("ch-2").is_ok());
    }

    #[test]
    fn missing_chapter_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source =
            DirectoryContentSource::new(dir.path(), FilePositionStore::new(dir.path()));
        assert!(source.load_chapter("nope").is_err());
        assert!(StaticContentSource::new().load_chapter("nope").is_err());
    }
}
