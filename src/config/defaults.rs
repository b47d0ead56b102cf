pub(crate) fn default_max_chunk_length() -> usize {
    4000
}

pub(crate) fn default_sentence_window_floor() -> usize {
    100
}

pub(crate) fn default_debounce_interval_ms() -> u64 {
    1000
}

pub(crate) fn default_flush_interval_ms() -> u64 {
    5000
}

pub(crate) fn default_chapters_dir() -> String {
    "chapters".to_string()
}

pub(crate) fn default_cache_dir() -> String {
    ".cache".to_string()
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Debug
}
