use super::models::EngineConfig;
use super::tables::ConfigTables;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> EngineConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return EngineConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(mut cfg) => {
            debug!("Parsed configuration from disk");
            clamp_config(&mut cfg);
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err:#}");
            EngineConfig::default()
        }
    }
}

/// Parse either the sectioned layout (`[speech]`, `[progress]`, ...) or the
/// flat key layout.
pub fn parse_config(contents: &str) -> Result<EngineConfig> {
    let table: toml::Table = toml::from_str(contents).context("Parsing config TOML")?;
    let sectioned = ConfigTables::SECTIONS
        .iter()
        .any(|section| table.get(*section).is_some_and(toml::Value::is_table));
    if sectioned {
        let tables: ConfigTables =
            toml::from_str(contents).context("Decoding sectioned config")?;
        Ok(tables.into())
    } else {
        toml::from_str(contents).context("Decoding flat config")
    }
}

/// Render the configuration in the sectioned layout.
pub fn serialize_config(config: &EngineConfig) -> Result<String> {
    toml::to_string(&ConfigTables::from(config)).context("Serializing config")
}

/// Keep runtime values in bounds regardless of config source.
pub fn clamp_config(config: &mut EngineConfig) {
    if config.max_chunk_length == 0 {
        warn!("max_chunk_length must be positive; using 1");
        config.max_chunk_length = 1;
    }
    if config.flush_interval_ms == 0 {
        config.flush_interval_ms = crate::config::defaults::default_flush_interval_ms();
    }
    if config.chapters_dir.trim().is_empty() {
        config.chapters_dir = crate::config::defaults::default_chapters_dir();
    }
    if config.cache_dir.trim().is_empty() {
        config.cache_dir = crate::config::defaults::default_cache_dir();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn parses_sectioned_tables() {
        let cfg = parse_config(
            r#"
            [speech]
            max_chunk_length = 250

            [progress]
            debounce_interval_ms = 400

            [logging]
            log_level = "warn"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.max_chunk_length, 250);
        assert_eq!(cfg.sentence_window_floor, 100);
        assert_eq!(cfg.debounce_interval_ms, 400);
        assert_eq!(cfg.flush_interval_ms, 5000);
        assert_eq!(cfg.log_level, LogLevel::Warn);
    }

    #[test]
    fn parses_flat_keys() {
        let cfg = parse_config("max_chunk_length = 120\ncache_dir = \"/tmp/x\"\n").unwrap();
        assert_eq!(cfg.max_chunk_length, 120);
        assert_eq!(cfg.cache_dir, "/tmp/x");
        assert_eq!(cfg.debounce_interval_ms, 1000);
    }

    #[test]
    fn serialized_tables_parse_back() {
        let mut cfg = EngineConfig::default();
        cfg.sentence_window_floor = 0;
        cfg.log_level = LogLevel::Trace;
        let text = serialize_config(&cfg).unwrap();
        assert!(text.contains("[speech]"));
        assert_eq!(parse_config(&text).unwrap(), cfg);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("absent.toml"));
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn invalid_file_falls_back_and_zero_chunk_length_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "max_chunk_length = \"lots\"").unwrap();
        assert_eq!(load_config(&bad), EngineConfig::default());

        let zero = dir.path().join("zero.toml");
        fs::write(&zero, "[speech]\nmax_chunk_length = 0\n").unwrap();
        assert_eq!(load_config(&zero).max_chunk_length, 1);
    }
}
