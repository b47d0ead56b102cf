//! Configuration loading for the reading engine.
//!
//! All tunables are centralized here and loaded from `conf/config.toml` if
//! present. Missing or invalid entries fall back to defaults so a chapter can
//! always be opened.

mod defaults;
mod io;
mod models;
mod tables;

pub use io::{clamp_config, load_config, parse_config, serialize_config};
pub use models::{EngineConfig, LogLevel};
