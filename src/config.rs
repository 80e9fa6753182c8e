// src/config.rs

use serde::Deserialize;

use crate::constants::DEFAULT_COMPLETION_QUEUE;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Path to an enrolled identity configuration document (JSON). When set,
    /// session init verifies the file exists before anything is allocated.
    pub identity: Option<String>,
    pub app_name: Option<String>,
    /// Logging / events configuration
    pub logging: Option<LoggingConfig>,
    /// Service catalog behavior
    pub services: Option<ServicesConfig>,
    /// Dial / completion delivery tuning
    pub dial: Option<DialConfig>,
}

impl Config {
    /// Load from a TOML file. A missing file falls back to defaults; a file
    /// that exists but fails to parse is surfaced as an error.
    pub fn load_or_default(path: Option<&str>) -> anyhow::Result<Config> {
        let path = path.unwrap_or("overlink.toml");
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(_) => Ok(Config::default()),
        }
    }

    /// Capacity of the bounded host completion queue (always at least 1).
    pub fn completion_queue_capacity(&self) -> usize {
        self.dial
            .as_ref()
            .and_then(|d| d.completion_queue)
            .unwrap_or(DEFAULT_COMPLETION_QUEUE)
            .max(1)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Path to JSON line event log (rotated). If unset, defaults to logs/overlink_events.jsonl
    pub json_path: Option<String>,
    /// Max size in bytes before rotation (default 5MB)
    pub json_max_bytes: Option<usize>,
    /// Number of rotated files to retain (default 3)
    pub json_rotate: Option<u32>,
    /// Disable console sink (default false)
    pub disable_console: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    /// Trigger a forced service-table refresh immediately after session init
    pub refresh_on_init: Option<bool>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            refresh_on_init: Some(false),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DialConfig {
    /// Capacity of the bounded host completion queue
    pub completion_queue: Option<usize>,
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            completion_queue: Some(DEFAULT_COMPLETION_QUEUE),
        }
    }
}
