//! Configuration file support for updater-export.
//!
//! Provides YAML-based configuration through `updater-export.config.yml`
//! files, including data structures, file loading, and validation.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::adapters::outbound::network::{default_user_agent, HttpSettings, DEFAULT_TIMEOUT_SECS};
use crate::logging::{is_known_level, LogFormat};
use crate::shared::error::ExportError;
use crate::shared::Result;
use crate::vulnerability_updates::domain::UpdaterName;

pub const CONFIG_FILENAME: &str = "updater-export.config.yml";

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub updaters: UpdatersSection,
    pub concurrency: Option<usize>,
    pub http: Option<HttpSection>,
    pub log: Option<LogSection>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Which updaters run and how each one is configured.
#[derive(Debug, Deserialize, Default)]
pub struct UpdatersSection {
    /// Enabled set; `None` runs every registered updater.
    pub sets: Option<Vec<String>>,
    /// Opaque per-updater fragments, decoded by each updater on demand.
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct HttpSection {
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LogSection {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl ConfigFile {
    /// Enabled updater names, or `None` when the file does not restrict them.
    pub fn enabled_names(&self) -> Result<Option<Vec<UpdaterName>>> {
        match &self.updaters.sets {
            None => Ok(None),
            Some(sets) => {
                let names = sets
                    .iter()
                    .map(|name| {
                        UpdaterName::new(name.as_str())
                            .with_context(|| format!("Invalid updater name in updaters.sets: '{}'", name))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Some(names))
            }
        }
    }

    pub fn fragments(&self) -> HashMap<String, serde_json::Value> {
        self.updaters.config.clone()
    }

    pub fn http_settings(&self) -> HttpSettings {
        let http = self.http.as_ref();
        HttpSettings {
            timeout: Duration::from_secs(
                http.and_then(|h| h.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            user_agent: http
                .and_then(|h| h.user_agent.clone())
                .unwrap_or_else(default_user_agent),
        }
    }

    pub fn log_level(&self) -> Option<&str> {
        self.log.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn log_format(&self) -> Result<Option<LogFormat>> {
        match self.log.as_ref().and_then(|l| l.format.as_deref()) {
            None => Ok(None),
            Some(format) => format
                .parse::<LogFormat>()
                .map(Some)
                .map_err(|e| anyhow::anyhow!(e)),
        }
    }
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile =
        serde_yaml_ng::from_str(&content).map_err(|e| ExportError::ConfigParseError {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    if config.concurrency == Some(0) {
        bail!(
            "Invalid config: concurrency must be greater than 0.\n\n\
             💡 Hint: Omit 'concurrency' to use the default of 4."
        );
    }

    if let Some(http) = &config.http {
        if http.timeout_secs == Some(0) {
            bail!(
                "Invalid config: http.timeout_secs must be greater than 0.\n\n\
                 💡 Hint: Omit 'timeout_secs' to use the default of {} seconds.",
                DEFAULT_TIMEOUT_SECS
            );
        }
    }

    if let Some(sets) = &config.updaters.sets {
        for (i, name) in sets.iter().enumerate() {
            if name.trim().is_empty() {
                bail!(
                    "Invalid config: updaters.sets[{}] must not be empty.\n\n\
                     💡 Hint: Each entry names a registered updater (e.g., \"osv\").",
                    i
                );
            }
        }
        config.enabled_names()?;
    }

    if let Some(level) = config.log_level() {
        if !is_known_level(level) {
            bail!(
                "Invalid config: unknown log.level '{}'.\n\n\
                 💡 Hint: Use one of trace, debug, info, warn, error.",
                level
            );
        }
    }
    config.log_format()?;

    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        eprintln!(
            "⚠️  Warning: Unknown config field '{}' will be ignored.",
            key
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("config.yml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_valid_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
updaters:
  sets: [osv, local]
  config:
    osv:
      url: "https://example.com/feed.json"
      ecosystem: PyPI
    local:
      path: feed.json
concurrency: 2
http:
  timeout_secs: 10
  user_agent: "custom/1.0"
log:
  level: debug
  format: json
"#,
        );

        let config = load_config_from_path(&path).unwrap();
        let names: Vec<String> = config
            .enabled_names()
            .unwrap()
            .unwrap()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["osv", "local"]);
        assert_eq!(config.concurrency, Some(2));
        assert_eq!(
            config.fragments()["osv"]["url"],
            serde_json::json!("https://example.com/feed.json")
        );
        let http = config.http_settings();
        assert_eq!(http.timeout, Duration::from_secs(10));
        assert_eq!(http.user_agent, "custom/1.0");
        assert_eq!(config.log_level(), Some("debug"));
        assert_eq!(config.log_format().unwrap(), Some(LogFormat::Json));
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "concurrency: 3\n");

        let config = load_config_from_path(&path).unwrap();
        assert!(config.enabled_names().unwrap().is_none());
        assert!(config.fragments().is_empty());
        assert_eq!(config.http_settings(), HttpSettings::default());
        assert!(config.log_level().is_none());
    }

    #[test]
    fn test_discover_config_found() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "updaters:\n  sets: [osv]\n").unwrap();

        let config = discover_config(dir.path()).unwrap();
        assert!(config.is_some());
    }

    #[test]
    fn test_discover_config_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config_from_path(Path::new("/nonexistent/config.yml"));
        let err = format!("{}", result.unwrap_err());
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_load_config_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "invalid: yaml: [[[broken");

        let err = load_config_from_path(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExportError>(),
            Some(ExportError::ConfigParseError { path: reported, .. }) if *reported == path
        ));
        let message = err.to_string();
        assert!(message.contains("Failed to parse configuration file"));
        assert!(message.contains("Details:"));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "concurrency: 0\n");

        let err = format!("{}", load_config_from_path(&path).unwrap_err());
        assert!(err.contains("concurrency must be greater than 0"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "http:\n  timeout_secs: 0\n");

        let err = format!("{}", load_config_from_path(&path).unwrap_err());
        assert!(err.contains("timeout_secs must be greater than 0"));
    }

    #[test]
    fn test_empty_updater_name_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "updaters:\n  sets: [osv, \"  \"]\n");

        let err = format!("{}", load_config_from_path(&path).unwrap_err());
        assert!(err.contains("updaters.sets[1] must not be empty"));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "log:\n  level: loud\n");

        let err = format!("{}", load_config_from_path(&path).unwrap_err());
        assert!(err.contains("unknown log.level"));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "log:\n  format: xml\n");

        assert!(load_config_from_path(&path).is_err());
    }

    #[test]
    fn test_unknown_fields_warning() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
concurrency: 1
unknown_field: true
another_unknown: value
"#,
        );

        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config.unknown_fields.len(), 2);
        assert!(config.unknown_fields.contains_key("unknown_field"));
        assert!(config.unknown_fields.contains_key("another_unknown"));
    }

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();
        assert!(config.updaters.sets.is_none());
        assert!(config.concurrency.is_none());
        assert!(config.http.is_none());
        assert!(config.log.is_none());
        assert!(config.unknown_fields.is_empty());
    }
}
