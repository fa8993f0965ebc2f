//! Loader configuration from environment variables and TOML files.
//!
//! Environment values that are missing or invalid fall back to defaults
//! without failing. A TOML file, when used, is parsed strictly.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `DRIVER_LOADER_CONFIG` | unset | TOML file read by [`load_layered`] |
//! | `DRIVER_LOADER_MAX_CLASS_VERSION` | 65 | Highest accepted class-file major version |
//! | `DRIVER_LOADER_MAX_ENTRY_BYTES` | 16777216 | Largest class entry read (bytes) |
//! | `DRIVER_LOADER_REQUIRED_INTERFACE` | unset | Interface driver classes must declare |
//! | `DRIVER_LOADER_LOG_LEVEL` | info | `EnvFilter` directive |
//! | `DRIVER_LOADER_LOG_FORMAT` | json | `json` or `pretty` |
//! | `DRIVER_LOADER_LOG_FILE` | unset | Log file (stderr when unset) |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::loader::LinkPolicy;
use crate::telemetry::{LogConfig, LogFormat};

const MIN_CLASS_VERSION: u16 = 45;
const MIN_ENTRY_BYTES: u64 = 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Invalid config file: {0}")]
    Parse(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// All loader configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub link: LinkPolicy,
    pub log: LogConfig,
}

/// Serializable summary of effective values.
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub max_class_version: u16,
    pub max_entry_bytes: u64,
    pub required_interface: Option<String>,
    pub log_level: String,
    pub log_format: String,
    pub log_file: Option<PathBuf>,
}

impl EnvConfig {
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            max_class_version: self.link.max_major_version,
            max_entry_bytes: self.link.max_entry_bytes,
            required_interface: self.link.required_interface.clone(),
            log_level: self.log.level.clone(),
            log_format: self.log.format.as_str().to_string(),
            log_file: self.log.output_path.clone(),
        }
    }

    /// Overlay environment variables onto `self`.
    fn apply_env(mut self) -> Self {
        if let Some(v) = env_parse::<u16>("DRIVER_LOADER_MAX_CLASS_VERSION") {
            self.link.max_major_version = v.max(MIN_CLASS_VERSION);
        }
        if let Some(v) = env_parse::<u64>("DRIVER_LOADER_MAX_ENTRY_BYTES") {
            self.link.max_entry_bytes = v.max(MIN_ENTRY_BYTES);
        }
        if let Some(v) = env_string("DRIVER_LOADER_REQUIRED_INTERFACE") {
            self.link.required_interface = Some(v);
        }
        if let Some(v) = env_string("DRIVER_LOADER_LOG_LEVEL") {
            self.log.level = v;
        }
        if let Some(format) = env_string("DRIVER_LOADER_LOG_FORMAT").and_then(|v| v.parse::<LogFormat>().ok()) {
            self.log.format = format;
        }
        if let Some(v) = env_string("DRIVER_LOADER_LOG_FILE") {
            self.log.output_path = Some(PathBuf::from(v));
        }
        self
    }
}

/// Non-empty env value, trimmed.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parsed env value; `None` on missing or invalid.
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse::<T>().ok())
}

/// Load configuration from environment variables only.
pub fn load() -> EnvConfig {
    EnvConfig::default().apply_env()
}

/// Load `DRIVER_LOADER_CONFIG` (if set), then apply environment overrides.
pub fn load_layered() -> Result<EnvConfig, ConfigError> {
    let base = match env_string("DRIVER_LOADER_CONFIG") {
        Some(path) => from_file(Path::new(&path))?,
        None => EnvConfig::default(),
    };
    Ok(base.apply_env())
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    loader: LoaderSection,
    #[serde(default)]
    log: LogSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoaderSection {
    max_class_version: Option<u16>,
    max_entry_bytes: Option<u64>,
    required_interface: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LogSection {
    level: Option<String>,
    format: Option<String>,
    file: Option<PathBuf>,
}

/// Parse a TOML document with `[loader]` and `[log]` tables.
pub fn from_toml_str(content: &str) -> Result<EnvConfig, ConfigError> {
    let file: FileConfig = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    let mut config = EnvConfig::default();

    if let Some(v) = file.loader.max_class_version {
        if v < MIN_CLASS_VERSION {
            return Err(ConfigError::InvalidValue {
                key: "loader.max_class_version",
                value: v.to_string(),
            });
        }
        config.link.max_major_version = v;
    }
    if let Some(v) = file.loader.max_entry_bytes {
        config.link.max_entry_bytes = v.max(MIN_ENTRY_BYTES);
    }
    config.link.required_interface = file.loader.required_interface.filter(|v| !v.trim().is_empty());

    if let Some(level) = file.log.level {
        config.log.level = level;
    }
    if let Some(format) = file.log.format {
        config.log.format = format.parse().map_err(|_| ConfigError::InvalidValue {
            key: "log.format",
            value: format.clone(),
        })?;
    }
    config.log.output_path = file.log.file;

    Ok(config)
}

pub fn from_file(path: &Path) -> Result<EnvConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    from_toml_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid cross-test pollution.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "DRIVER_LOADER_CONFIG",
        "DRIVER_LOADER_MAX_CLASS_VERSION",
        "DRIVER_LOADER_MAX_ENTRY_BYTES",
        "DRIVER_LOADER_REQUIRED_INTERFACE",
        "DRIVER_LOADER_LOG_LEVEL",
        "DRIVER_LOADER_LOG_FORMAT",
        "DRIVER_LOADER_LOG_FILE",
    ];

    fn clear_env_vars() {
        for k in ENV_KEYS {
            std::env::remove_var(k);
        }
    }

    #[test]
    fn test_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let cfg = load();
        assert_eq!(cfg.link.max_major_version, 65);
        assert_eq!(cfg.link.max_entry_bytes, 16 * 1024 * 1024);
        assert_eq!(cfg.link.required_interface, None);
        assert_eq!(cfg.log.level, "info");
        assert_eq!(cfg.log.format, LogFormat::Json);
        assert_eq!(cfg.log.output_path, None);
    }

    #[test]
    fn test_env_overrides() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("DRIVER_LOADER_MAX_CLASS_VERSION", "61");
        std::env::set_var("DRIVER_LOADER_REQUIRED_INTERFACE", "java.sql.Driver");
        std::env::set_var("DRIVER_LOADER_LOG_FORMAT", "pretty");
        std::env::set_var("DRIVER_LOADER_LOG_LEVEL", "driver_loader=debug");
        let cfg = load();
        assert_eq!(cfg.link.max_major_version, 61);
        assert_eq!(cfg.link.required_interface.as_deref(), Some("java.sql.Driver"));
        assert_eq!(cfg.log.format, LogFormat::Pretty);
        assert_eq!(cfg.log.level, "driver_loader=debug");
        clear_env_vars();
    }

    #[test]
    fn test_invalid_env_falls_back() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("DRIVER_LOADER_MAX_CLASS_VERSION", "sixty");
        std::env::set_var("DRIVER_LOADER_LOG_FORMAT", "xml");
        std::env::set_var("DRIVER_LOADER_REQUIRED_INTERFACE", "   ");
        let cfg = load();
        assert_eq!(cfg.link.max_major_version, 65);
        assert_eq!(cfg.log.format, LogFormat::Json);
        assert_eq!(cfg.link.required_interface, None);
        clear_env_vars();
    }

    #[test]
    fn test_env_floors() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("DRIVER_LOADER_MAX_CLASS_VERSION", "1");
        std::env::set_var("DRIVER_LOADER_MAX_ENTRY_BYTES", "0");
        let cfg = load();
        assert_eq!(cfg.link.max_major_version, MIN_CLASS_VERSION);
        assert_eq!(cfg.link.max_entry_bytes, MIN_ENTRY_BYTES);
        clear_env_vars();
    }

    #[test]
    fn test_toml() {
        let cfg = from_toml_str(
            r#"
            [loader]
            max_class_version = 55
            required_interface = "java.sql.Driver"

            [log]
            format = "pretty"
            file = "/var/log/hive_fdw/loader.log"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.link.max_major_version, 55);
        assert_eq!(cfg.link.max_entry_bytes, LinkPolicy::default().max_entry_bytes);
        assert_eq!(cfg.link.required_interface.as_deref(), Some("java.sql.Driver"));
        assert_eq!(cfg.log.format, LogFormat::Pretty);
        assert_eq!(cfg.log.output_path, Some(PathBuf::from("/var/log/hive_fdw/loader.log")));
    }

    #[test]
    fn test_toml_rejects_bad_values() {
        assert!(matches!(from_toml_str("[loader]\nmax_class_version = 10"), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(from_toml_str("[log]\nformat = \"xml\""), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(from_toml_str("[loader]\nunknown = 1"), Err(ConfigError::Parse(_))));
        assert!(from_toml_str("").unwrap() == EnvConfig::default());
    }

    #[test]
    fn test_layered_file_then_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loader.toml");
        std::fs::write(&path, "[loader]\nmax_class_version = 52\nmax_entry_bytes = 4096\n").unwrap();

        std::env::set_var("DRIVER_LOADER_CONFIG", &path);
        std::env::set_var("DRIVER_LOADER_MAX_CLASS_VERSION", "61");
        let cfg = load_layered().unwrap();
        assert_eq!(cfg.link.max_major_version, 61);
        assert_eq!(cfg.link.max_entry_bytes, 4096);

        std::env::set_var("DRIVER_LOADER_CONFIG", dir.path().join("missing.toml"));
        assert!(matches!(load_layered(), Err(ConfigError::Read { .. })));
        clear_env_vars();
    }
}
