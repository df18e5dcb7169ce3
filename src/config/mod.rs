use crate::error::{DblogError, Result};
use crate::logs::LOG_FILE_NAME;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file used by the CLI
pub const CONFIG_ENV: &str = "DBLOG_FILE_CONFIG";

/// Where things live: passed explicitly to every component that needs a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DblogConfig {
    /// Public files directory holding the log file
    #[serde(default = "default_public_files")]
    pub public_files: PathBuf,

    /// TOML file with the sink settings
    #[serde(default = "default_settings_file")]
    pub settings_file: PathBuf,

    /// Listen address of the download server
    #[serde(default = "default_bind")]
    pub bind: String,
}

// Default value functions for serde
fn default_public_files() -> PathBuf {
    PathBuf::from("sites/default/files")
}

fn default_settings_file() -> PathBuf {
    PathBuf::from("dblog_file.settings.toml")
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for DblogConfig {
    fn default() -> Self {
        Self {
            public_files: default_public_files(),
            settings_file: default_settings_file(),
            bind: default_bind(),
        }
    }
}

impl DblogConfig {
    /// Load the configuration from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<DblogConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DblogError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let mut config = match extension {
            "toml" => Self::parse_toml(&contents)?,
            "json" => Self::parse_json(&contents)?,
            _ => {
                return Err(DblogError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.expand_env_vars();
        config.validate()?;

        Ok(config)
    }

    /// Load from `path` if given, else from `$DBLOG_FILE_CONFIG`, else defaults
    pub fn discover(path: Option<&Path>) -> Result<DblogConfig> {
        match path {
            Some(path) => Self::from_file(path),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(path) => Self::from_file(Path::new(&path)),
                None => Ok(DblogConfig::default()),
            },
        }
    }

    fn parse_toml(contents: &str) -> Result<DblogConfig> {
        toml::from_str(contents)
            .map_err(|e| DblogError::InvalidConfig(format!("Failed to parse TOML: {}", e)))
    }

    fn parse_json(contents: &str) -> Result<DblogConfig> {
        serde_json::from_str(contents)
            .map_err(|e| DblogError::InvalidConfig(format!("Failed to parse JSON: {}", e)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.public_files.as_os_str().is_empty() {
            return Err(DblogError::ConfigValidationError(
                "public_files must not be empty".to_string(),
            ));
        }

        if self.settings_file.as_os_str().is_empty() {
            return Err(DblogError::ConfigValidationError(
                "settings_file must not be empty".to_string(),
            ));
        }

        self.bind_addr()?;
        Ok(())
    }

    /// Path of the bounded log file
    pub fn log_path(&self) -> PathBuf {
        self.public_files.join(LOG_FILE_NAME)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind.parse().map_err(|e| {
            DblogError::ConfigValidationError(format!("Invalid bind address {}: {}", self.bind, e))
        })
    }

    /// Expand environment variables in the path fields
    fn expand_env_vars(&mut self) {
        self.public_files = expand_env_in_path(&self.public_files);
        self.settings_file = expand_env_in_path(&self.settings_file);
    }
}

/// Expand `$VAR` and `${VAR}` in a string.
///
/// A bare name runs as far as `[A-Za-z0-9_]` allows. Unset variables and
/// malformed references are left as written.
fn expand_env_in_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(dollar) = rest.find('$') {
        result.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];

        let (name, consumed) = match after.strip_prefix('{') {
            Some(braced) => match braced.find('}') {
                Some(close) if is_var_name(&braced[..close]) => (&braced[..close], close + 2),
                _ => ("", 0),
            },
            None => {
                let len = after
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(after.len());
                (&after[..len], len)
            }
        };

        match std::env::var(name) {
            Ok(value) if !name.is_empty() => {
                result.push_str(&value);
                rest = &after[consumed..];
            }
            _ => {
                result.push('$');
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

fn is_var_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn expand_env_in_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(expand_env_in_string(&path_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DblogConfig::default();
        assert_eq!(config.log_path(), PathBuf::from("sites/default/files/dblog-file.log"));
        assert_eq!(config.settings_file, PathBuf::from("dblog_file.settings.toml"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml_partial() {
        let config = DblogConfig::parse_toml(r#"public_files = "/var/www/files""#).unwrap();
        assert_eq!(config.public_files, PathBuf::from("/var/www/files"));
        assert_eq!(config.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_json() {
        let config = DblogConfig::parse_json(
            r#"{"public_files": "/srv/files", "bind": "0.0.0.0:9000"}"#,
        )
        .unwrap();
        assert_eq!(config.log_path(), PathBuf::from("/srv/files/dblog-file.log"));
        assert_eq!(config.bind_addr().unwrap().port(), 9000);
    }

    #[test]
    fn test_validate_bad_bind() {
        let config = DblogConfig {
            bind: "not an address".to_string(),
            ..DblogConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DblogError::ConfigValidationError(_))
        ));
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("DBLOG_TEST_ROOT", "/tmp/site");

        let mut config = DblogConfig {
            public_files: PathBuf::from("${DBLOG_TEST_ROOT}/files"),
            settings_file: PathBuf::from("$DBLOG_TEST_ROOT/settings.toml"),
            bind: default_bind(),
        };
        config.expand_env_vars();

        assert_eq!(config.public_files, PathBuf::from("/tmp/site/files"));
        assert_eq!(config.settings_file, PathBuf::from("/tmp/site/settings.toml"));
    }

    #[test]
    fn test_expand_prefers_longest_variable_name() {
        std::env::set_var("DBLOG_PREFIX", "WRONG");
        std::env::set_var("DBLOG_PREFIX_ROOT", "/srv/site");

        assert_eq!(
            expand_env_in_path(Path::new("$DBLOG_PREFIX_ROOT/files")),
            PathBuf::from("/srv/site/files")
        );
        assert_eq!(
            expand_env_in_string("${DBLOG_PREFIX}_ROOT/files"),
            "WRONG_ROOT/files"
        );
    }

    #[test]
    fn test_expand_leaves_unset_and_malformed_references() {
        std::env::remove_var("DBLOG_UNSET_VAR");

        assert_eq!(expand_env_in_string("$DBLOG_UNSET_VAR/x"), "$DBLOG_UNSET_VAR/x");
        assert_eq!(expand_env_in_string("${DBLOG_UNSET_VAR}/x"), "${DBLOG_UNSET_VAR}/x");
        assert_eq!(expand_env_in_string("${unclosed/x"), "${unclosed/x");
        assert_eq!(expand_env_in_string("cost $5"), "cost $5");
        assert_eq!(expand_env_in_string("trailing $"), "trailing $");
    }

    #[test]
    fn test_from_file_unsupported_format() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "public_files: x").unwrap();

        let result = DblogConfig::from_file(&config_path);
        assert!(matches!(result, Err(DblogError::InvalidConfig(_))));
    }

    #[test]
    fn test_discover_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("dblog.toml");
        fs::write(&config_path, "bind = \"127.0.0.1:7000\"\n").unwrap();

        let config = DblogConfig::discover(Some(&config_path)).unwrap();
        assert_eq!(config.bind, "127.0.0.1:7000");
    }
}
