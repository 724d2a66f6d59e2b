use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::constants::MIN_RUN_INTERVAL_SECS;
use crate::error::{Result, SyncError};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub workbook: WorkbookConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct WorkbookConfig {
    /// Directory holding one JSON grid per workbook tab.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between watch-mode runs. Clamped to MIN_RUN_INTERVAL_SECS.
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
}

fn default_interval_seconds() -> u64 {
    900
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { interval_seconds: default_interval_seconds() }
    }
}

impl Config {
    /// Loads `config.toml` when present and applies environment overrides.
    ///
    /// `WORKBOOK_PATH` takes precedence over the file, matching how the
    /// original deployment configured its sheet location. A missing workbook
    /// path is a configuration error raised before any I/O is attempted.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match fs::read_to_string("config.toml") {
            Ok(content) => toml::from_str::<Config>(&content)?,
            Err(_) => Config::default(),
        };

        if let Ok(path) = std::env::var("WORKBOOK_PATH") {
            if !path.trim().is_empty() {
                config.workbook.path = Some(path);
            }
        }
        if let Ok(raw) = std::env::var("RUN_INTERVAL_SECONDS") {
            if let Ok(seconds) = raw.parse::<u64>() {
                config.scheduler.interval_seconds = seconds;
            }
        }

        Ok(config)
    }

    /// The workbook directory, required for every command.
    pub fn workbook_path(&self) -> Result<PathBuf> {
        self.workbook
            .path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                SyncError::Config(
                    "workbook path is not configured (set WORKBOOK_PATH or workbook.path in config.toml)"
                        .to_string(),
                )
            })
    }

    /// Watch interval with the anti-hammering floor applied.
    pub fn run_interval_secs(&self) -> u64 {
        self.scheduler.interval_seconds.max(MIN_RUN_INTERVAL_SECS)
    }
}
