use serde::Deserialize;

/// Flat engine configuration; deserializable from TOML.
#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
pub struct EngineConfig {
    #[serde(default = "crate::config::defaults::default_max_chunk_length")]
    pub max_chunk_length: usize,
    #[serde(default = "crate::config::defaults::default_sentence_window_floor")]
    pub sentence_window_floor: usize,
    #[serde(default = "crate::config::defaults::default_debounce_interval_ms")]
    pub debounce_interval_ms: u64,
    #[serde(default = "crate::config::defaults::default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    #[serde(default = "crate::config::defaults::default_chapters_dir")]
    pub chapters_dir: String,
    #[serde(default = "crate::config::defaults::default_cache_dir")]
    pub cache_dir: String,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_chunk_length: crate::config::defaults::default_max_chunk_length(),
            sentence_window_floor: crate::config::defaults::default_sentence_window_floor(),
            debounce_interval_ms: crate::config::defaults::default_debounce_interval_ms(),
            flush_interval_ms: crate::config::defaults::default_flush_interval_ms(),
            chapters_dir: crate::config::defaults::default_chapters_dir(),
            cache_dir: crate::config::defaults::default_cache_dir(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
