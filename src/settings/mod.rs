// Settings module - Operator settings read by the sink on every record

use crate::error::{DblogError, Result};
use crate::logs::LogLevel;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Smallest accepted line limit
pub const MIN_LINES: u32 = 1;

/// Largest accepted line limit
pub const MAX_LINES: u32 = 25_000;

/// Operator settings for the file sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkSettings {
    /// Master switch; nothing is written while false
    #[serde(default)]
    pub enabled: bool,

    /// Maximum number of lines retained in the log file
    #[serde(default = "default_count")]
    pub count: u32,

    /// Levels that are written to the file
    #[serde(default)]
    pub types: Vec<LogLevel>,
}

fn default_count() -> u32 {
    1000
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            count: default_count(),
            types: Vec::new(),
        }
    }
}

impl SinkSettings {
    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if !(MIN_LINES..=MAX_LINES).contains(&self.count) {
            return Err(DblogError::ConfigValidationError(format!(
                "count must be between {} and {}, got {}",
                MIN_LINES, MAX_LINES, self.count
            )));
        }
        Ok(())
    }

    /// Whether a record of this level passes the gate
    pub fn accepts(&self, level: LogLevel) -> bool {
        self.enabled && self.types.contains(&level)
    }

    pub fn max_lines(&self) -> usize {
        self.count as usize
    }

    /// Replace the allowed levels, dropping duplicates and keeping severity order
    pub fn set_types<I: IntoIterator<Item = LogLevel>>(&mut self, types: I) {
        let mut types: Vec<LogLevel> = types.into_iter().collect();
        types.sort();
        types.dedup();
        self.types = types;
    }
}

/// Where the sink reads its settings from
pub trait SettingsStore: Send + Sync {
    /// Fetch the current settings; called once per record, never cached
    fn load(&self) -> Result<SinkSettings>;

    /// Persist new settings
    fn save(&self, settings: &SinkSettings) -> Result<()>;
}

/// Settings persisted as a TOML file
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the path to the settings file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<SinkSettings> {
        // No file yet means the sink was never configured
        if !self.path.exists() {
            return Ok(SinkSettings::default());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| {
            DblogError::SettingsLoadError(format!("Failed to read settings file: {}", e))
        })?;

        let settings: SinkSettings = toml::from_str(&contents).map_err(|e| {
            DblogError::SettingsLoadError(format!("Failed to parse settings file: {}", e))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    fn save(&self, settings: &SinkSettings) -> Result<()> {
        settings.validate()?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    DblogError::SettingsSaveError(format!(
                        "Failed to create settings directory: {}",
                        e
                    ))
                })?;
            }
        }

        let contents = toml::to_string_pretty(settings).map_err(|e| {
            DblogError::SettingsSaveError(format!("Failed to serialize settings: {}", e))
        })?;

        // Write to a temporary file first, then rename over the old one
        let temp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&temp_path).map_err(|e| {
                DblogError::SettingsSaveError(format!("Failed to create temp settings file: {}", e))
            })?;
            let mut writer = BufWriter::new(file);
            writer.write_all(contents.as_bytes()).map_err(|e| {
                DblogError::SettingsSaveError(format!("Failed to write settings file: {}", e))
            })?;
            writer.flush().map_err(|e| {
                DblogError::SettingsSaveError(format!("Failed to flush settings file: {}", e))
            })?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            DblogError::SettingsSaveError(format!("Failed to rename temp settings file: {}", e))
        })?;

        tracing::info!(path = %self.path.display(), "Saved sink settings");
        Ok(())
    }
}

/// Settings held in memory, for embedding the sink without a settings file
#[derive(Debug, Default)]
pub struct MemorySettings {
    settings: RwLock<SinkSettings>,
}

impl MemorySettings {
    pub fn new(settings: SinkSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }
}

impl SettingsStore for MemorySettings {
    fn load(&self) -> Result<SinkSettings> {
        self.settings
            .read()
            .map(|guard| guard.clone())
            .map_err(|e| DblogError::SettingsLoadError(e.to_string()))
    }

    fn save(&self, settings: &SinkSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self
            .settings
            .write()
            .map_err(|e| DblogError::SettingsSaveError(e.to_string()))?;
        *guard = settings.clone();
        Ok(())
    }
}
