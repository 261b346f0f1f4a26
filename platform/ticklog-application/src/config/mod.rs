use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use ticklog_domain::value_objects::retention::RetentionWindow;

pub const DEFAULT_DATA_DIR: &str = "data/signals";
pub const DEFAULT_FILE_EXTENSION: &str = "csv";
pub const DEFAULT_MAX_AGE_DAYS: i64 = 90;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    pub retention: Option<RetentionConfig>,
    pub logging: Option<LoggingConfig>,
    pub validation: Option<ValidationConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    pub data_dir: String,
    pub file_extension: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.to_string(),
            file_extension: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    pub max_age: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    pub max_malformed: Option<usize>,
}

impl Config {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }

    pub fn file_extension(&self) -> &str {
        self.storage
            .file_extension
            .as_deref()
            .unwrap_or(DEFAULT_FILE_EXTENSION)
    }

    pub fn retention_window(&self) -> Result<RetentionWindow, String> {
        match self.retention.as_ref().and_then(|r| r.max_age.as_deref()) {
            Some(raw) => RetentionWindow::parse(raw)
                .map_err(|err| format!("invalid retention.max_age: {err}")),
            None => Ok(RetentionWindow::from_days(DEFAULT_MAX_AGE_DAYS)),
        }
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or("info")
    }

    pub fn log_format(&self) -> LogFormat {
        self.logging
            .as_ref()
            .and_then(|l| l.format)
            .unwrap_or_default()
    }

    pub fn max_malformed(&self) -> usize {
        self.validation
            .as_ref()
            .and_then(|v| v.max_malformed)
            .unwrap_or(0)
    }
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
    config.retention_window()?;
    Ok(config)
}

/// Loads `path` when given, built-in defaults otherwise.
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, String> {
    match path {
        Some(path) => load_config(path),
        None => Ok(Config::default()),
    }
}
