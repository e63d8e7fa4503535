//! Loader configuration from environment variables.
//!
//! All values come from `CLIENT_LOADER_*` environment variables with
//! defaults. Invalid values fall back to defaults without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `CLIENT_LOADER_BASE_PATH` | "" | Prefix for every fetch URL |
//! | `CLIENT_LOADER_ROOT` | `.` | Directory the filesystem transport serves |
//! | `CLIENT_LOADER_CACHE_TIMESTAMP` | unset | Cache generation token |
//! | `CLIENT_LOADER_CACHE_DIR` | unset | Persistent file cache directory |
//! | `CLIENT_LOADER_LIBS` | unset | Libs config file (JSON or TOML) |
//! | `CLIENT_LOADER_LOG_FORMAT` | `json` | `json` or `pretty` |
//! | `CLIENT_LOADER_LOG_LEVEL` | `info` | `EnvFilter` directive |
//! | `CLIENT_LOADER_LOG_FILE` | unset | Append logs to this file instead of stderr |
//! | `CLIENT_LOADER_LOG_LOAD_SPANS` | `false` | Log each `module_load` span on close |

use serde::Serialize;
use std::path::PathBuf;

use crate::libs::{ConfigError, LibsConfig};
use crate::loader::LoaderConfig;
use crate::telemetry::{LogConfig, LogFormat};

/// Effective configuration summary, printed by `config show`.
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub base_path: String,
    pub root: String,
    pub cache_timestamp: Option<String>,
    pub cache_dir: Option<String>,
    pub libs: Option<String>,
    pub log_format: String,
    pub log_level: String,
    pub log_file: Option<String>,
    pub log_load_spans: bool,
}

/// All configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub base_path: String,
    pub root: PathBuf,
    pub cache_timestamp: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub libs_path: Option<PathBuf>,
    pub log: LogConfig,
}

/// Non-empty string env var.
fn parse_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_path(key: &str) -> Option<PathBuf> {
    parse_string(key).map(PathBuf::from)
}

/// `true`/`1`/`yes` (any case); anything else is false.
fn parse_bool(key: &str) -> bool {
    parse_string(key).is_some_and(|v| {
        matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
    })
}

/// Load logging configuration from environment.
fn load_log_config() -> LogConfig {
    let format = parse_string("CLIENT_LOADER_LOG_FORMAT")
        .and_then(|v| v.parse::<LogFormat>().ok())
        .unwrap_or_default();
    let level = parse_string("CLIENT_LOADER_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

    LogConfig {
        format,
        level,
        output_path: parse_path("CLIENT_LOADER_LOG_FILE"),
        load_spans: parse_bool("CLIENT_LOADER_LOG_LOAD_SPANS"),
    }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to defaults without panicking.
pub fn load() -> EnvConfig {
    EnvConfig {
        base_path: std::env::var("CLIENT_LOADER_BASE_PATH").unwrap_or_default(),
        root: parse_path("CLIENT_LOADER_ROOT").unwrap_or_else(|| PathBuf::from(".")),
        cache_timestamp: parse_string("CLIENT_LOADER_CACHE_TIMESTAMP"),
        cache_dir: parse_path("CLIENT_LOADER_CACHE_DIR"),
        libs_path: parse_path("CLIENT_LOADER_LIBS"),
        log: load_log_config(),
    }
}

impl EnvConfig {
    /// Loader settings, reading the libs config file when one is set.
    pub fn loader_config(&self) -> Result<LoaderConfig, ConfigError> {
        let libs = match &self.libs_path {
            Some(path) => LibsConfig::from_file(path)?,
            None => LibsConfig::new(),
        };
        Ok(LoaderConfig {
            base_path: self.base_path.clone(),
            cache_timestamp: self.cache_timestamp.clone(),
            libs,
        })
    }

    /// Return a serializable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        let display = |p: &PathBuf| p.display().to_string();
        EffectiveConfig {
            base_path: self.base_path.clone(),
            root: display(&self.root),
            cache_timestamp: self.cache_timestamp.clone(),
            cache_dir: self.cache_dir.as_ref().map(display),
            libs: self.libs_path.as_ref().map(display),
            log_format: self.log.format.to_string(),
            log_level: self.log.level.clone(),
            log_file: self.log.output_path.as_ref().map(display),
            log_load_spans: self.log.load_spans,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid cross-test pollution.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "CLIENT_LOADER_BASE_PATH",
        "CLIENT_LOADER_ROOT",
        "CLIENT_LOADER_CACHE_TIMESTAMP",
        "CLIENT_LOADER_CACHE_DIR",
        "CLIENT_LOADER_LIBS",
        "CLIENT_LOADER_LOG_FORMAT",
        "CLIENT_LOADER_LOG_LEVEL",
        "CLIENT_LOADER_LOG_FILE",
        "CLIENT_LOADER_LOG_LOAD_SPANS",
    ];

    fn clear_env_vars() {
        for k in ENV_KEYS {
            std::env::remove_var(k);
        }
    }

    #[test]
    fn test_defaults_are_sensible() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();

        let cfg = load();
        assert_eq!(cfg.base_path, "");
        assert_eq!(cfg.root, PathBuf::from("."));
        assert!(cfg.cache_timestamp.is_none());
        assert!(cfg.cache_dir.is_none());
        assert_eq!(cfg.log.format, LogFormat::Json);
        assert_eq!(cfg.log.level, "info");
        assert!(cfg.log.output_path.is_none());
        assert!(!cfg.log.load_spans);

        let loader = cfg.loader_config().unwrap();
        assert!(loader.libs.is_empty());
    }

    #[test]
    fn test_env_vars_override_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();

        std::env::set_var("CLIENT_LOADER_BASE_PATH", "/espo/");
        std::env::set_var("CLIENT_LOADER_CACHE_TIMESTAMP", "1700000000");
        std::env::set_var("CLIENT_LOADER_LOG_FORMAT", "pretty");
        std::env::set_var("CLIENT_LOADER_LOG_LEVEL", "client_loader=debug");
        std::env::set_var("CLIENT_LOADER_LOG_FILE", "/var/log/client-loader.log");
        std::env::set_var("CLIENT_LOADER_LOG_LOAD_SPANS", "Yes");

        let cfg = load();
        assert_eq!(cfg.base_path, "/espo/");
        assert_eq!(cfg.cache_timestamp.as_deref(), Some("1700000000"));
        assert_eq!(cfg.log.format, LogFormat::Pretty);
        assert!(cfg.log.load_spans);
        let effective = cfg.effective_config();
        assert_eq!(effective.log_level, "client_loader=debug");
        assert_eq!(effective.log_format, "pretty");
        assert_eq!(effective.log_file.as_deref(), Some("/var/log/client-loader.log"));

        clear_env_vars();
    }

    #[test]
    fn test_invalid_env_falls_back_to_default() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();

        std::env::set_var("CLIENT_LOADER_LOG_FORMAT", "xml");
        std::env::set_var("CLIENT_LOADER_CACHE_TIMESTAMP", "  ");
        std::env::set_var("CLIENT_LOADER_LOG_LOAD_SPANS", "sometimes");

        let cfg = load();
        assert_eq!(cfg.log.format, LogFormat::Json);
        assert!(!cfg.log.load_spans);
        assert!(cfg.cache_timestamp.is_none());

        clear_env_vars();
    }

    #[test]
    fn test_libs_file_is_read() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"moment": {{"path": "client/lib/moment.js"}}}}"#).unwrap();
        std::env::set_var("CLIENT_LOADER_LIBS", file.path());

        let loader = load().loader_config().unwrap();
        assert_eq!(loader.libs.target("moment").path, "client/lib/moment.js");

        clear_env_vars();
    }

    #[test]
    fn test_missing_libs_file_is_an_error() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();

        std::env::set_var("CLIENT_LOADER_LIBS", "/nonexistent/libs.json");
        assert!(matches!(load().loader_config(), Err(ConfigError::Read { .. })));

        clear_env_vars();
    }
}
