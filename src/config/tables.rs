use super::defaults;
use super::models::{EngineConfig, LogLevel};
use serde::Deserialize;

/// Sectioned on-disk layout of `conf/config.toml`.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    speech: SpeechConfig,
    #[serde(default)]
    progress: ProgressConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl ConfigTables {
    /// Top-level keys that only appear in the sectioned layout.
    pub(super) const SECTIONS: [&'static str; 4] = ["speech", "progress", "storage", "logging"];
}

impl From<ConfigTables> for EngineConfig {
    fn from(tables: ConfigTables) -> Self {
        EngineConfig {
            max_chunk_length: tables.speech.max_chunk_length,
            sentence_window_floor: tables.speech.sentence_window_floor,
            debounce_interval_ms: tables.progress.debounce_interval_ms,
            flush_interval_ms: tables.progress.flush_interval_ms,
            chapters_dir: tables.storage.chapters_dir,
            cache_dir: tables.storage.cache_dir,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&EngineConfig> for ConfigTables {
    fn from(config: &EngineConfig) -> Self {
        ConfigTables {
            speech: SpeechConfig {
                max_chunk_length: config.max_chunk_length,
                sentence_window_floor: config.sentence_window_floor,
            },
            progress: ProgressConfig {
                debounce_interval_ms: config.debounce_interval_ms,
                flush_interval_ms: config.flush_interval_ms,
            },
            storage: StorageConfig {
                chapters_dir: config.chapters_dir.clone(),
                cache_dir: config.cache_dir.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct SpeechConfig {
    #[serde(default = "defaults::default_max_chunk_length")]
    max_chunk_length: usize,
    #[serde(default = "defaults::default_sentence_window_floor")]
    sentence_window_floor: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        SpeechConfig {
            max_chunk_length: defaults::default_max_chunk_length(),
            sentence_window_floor: defaults::default_sentence_window_floor(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ProgressConfig {
    #[serde(default = "defaults::default_debounce_interval_ms")]
    debounce_interval_ms: u64,
    #[serde(default = "defaults::default_flush_interval_ms")]
    flush_interval_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        ProgressConfig {
            debounce_interval_ms: defaults::default_debounce_interval_ms(),
            flush_interval_ms: defaults::default_flush_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_chapters_dir")]
    chapters_dir: String,
    #[serde(default = "defaults::default_cache_dir")]
    cache_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            chapters_dir: defaults::default_chapters_dir(),
            cache_dir: defaults::default_cache_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
