use std::path::PathBuf;
use thiserror::Error;

/// Main error type for dblog-file
#[derive(Debug, Error)]
pub enum DblogError {
    // Log file errors
    #[error("Log error: {0}")]
    LogError(String),

    #[error("Failed to open log file: {0}")]
    LogFileError(String),

    #[error("Failed to lock log file: {0}")]
    LockError(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Cannot read file: {0}")]
    FileUnreadable(String),

    // Record errors
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Invalid context entry: {0}")]
    InvalidContext(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // Settings store errors
    #[error("Failed to load settings: {0}")]
    SettingsLoadError(String),

    #[error("Failed to save settings: {0}")]
    SettingsSaveError(String),

    // HTTP server errors
    #[error("Server error: {0}")]
    ServerError(String),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for dblog-file operations
pub type Result<T> = std::result::Result<T, DblogError>;
