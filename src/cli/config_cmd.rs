//! Config CLI subcommands: show, defaults, validate.
//!
//! These commands read configuration directly from environment variables.

use crate::config::{self, EffectiveConfig};

use super::{EXIT_FAILURE, EXIT_OK};

/// Print effective config as key-value pairs to stdout.
pub fn run_show(json: bool) {
    let cfg = config::load().effective_config();
    if json {
        match serde_json::to_string_pretty(&cfg) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("Failed to render config: {e}"),
        }
    } else {
        for line in render(&cfg) {
            println!("{line}");
        }
    }
}

/// Print default config values (no env overrides) to stdout.
pub fn run_defaults() {
    println!("CLIENT_LOADER_BASE_PATH=");
    println!("CLIENT_LOADER_ROOT=.");
    println!("CLIENT_LOADER_CACHE_TIMESTAMP=");
    println!("CLIENT_LOADER_CACHE_DIR=");
    println!("CLIENT_LOADER_LIBS=");
    println!("CLIENT_LOADER_LOG_FORMAT=json");
    println!("CLIENT_LOADER_LOG_LEVEL=info");
    println!("CLIENT_LOADER_LOG_FILE=");
    println!("CLIENT_LOADER_LOG_LOAD_SPANS=false");
}

/// Validate configuration for obvious misconfigurations.
///
/// Returns 0 if valid, 1 if any warnings are found.
pub fn run_validate() -> i32 {
    let env = config::load();
    let mut warnings = 0;

    if !env.root.is_dir() {
        eprintln!("WARNING: CLIENT_LOADER_ROOT ({}) is not a directory", env.root.display());
        warnings += 1;
    }

    if let Err(e) = env.loader_config() {
        eprintln!("WARNING: CLIENT_LOADER_LIBS: {e}");
        warnings += 1;
    }

    if env.cache_dir.is_some() && env.cache_timestamp.is_none() {
        eprintln!("WARNING: CLIENT_LOADER_CACHE_DIR is set without CLIENT_LOADER_CACHE_TIMESTAMP");
        warnings += 1;
    }

    if warnings == 0 {
        println!("Configuration is valid.");
        EXIT_OK
    } else {
        EXIT_FAILURE
    }
}

fn render(cfg: &EffectiveConfig) -> Vec<String> {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    vec![
        format!("CLIENT_LOADER_BASE_PATH={}", cfg.base_path),
        format!("CLIENT_LOADER_ROOT={}", cfg.root),
        format!("CLIENT_LOADER_CACHE_TIMESTAMP={}", opt(&cfg.cache_timestamp)),
        format!("CLIENT_LOADER_CACHE_DIR={}", opt(&cfg.cache_dir)),
        format!("CLIENT_LOADER_LIBS={}", opt(&cfg.libs)),
        format!("CLIENT_LOADER_LOG_FORMAT={}", cfg.log_format),
        format!("CLIENT_LOADER_LOG_LEVEL={}", cfg.log_level),
        format!("CLIENT_LOADER_LOG_FILE={}", opt(&cfg.log_file)),
        format!("CLIENT_LOADER_LOG_LOAD_SPANS={}", cfg.log_load_spans),
    ]
}
