//! `load` subcommand: load one identifier from the filesystem and print it.

use std::sync::Arc;

use crate::cache::FileCache;
use crate::config::{self, EnvConfig};
use crate::executor::LinkedHost;
use crate::loader::Loader;
use crate::registry::Export;
use crate::transport::FsTransport;

use super::{EXIT_FAILURE, EXIT_OK};

/// Load `name` with the environment configuration.
///
/// Text resources are printed as is; other values are summarized.
pub async fn run_load(name: &str) -> i32 {
    let env = config::load();
    let loader = match build_loader(&env) {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("load: {e}");
            return EXIT_FAILURE;
        }
    };

    match loader.load(name).await {
        Ok(value) => {
            println!("{}", describe(&value));
            EXIT_OK
        }
        Err(e) => {
            eprintln!("load: {e}");
            EXIT_FAILURE
        }
    }
}

/// Filesystem-backed loader, with a file cache when one is configured.
pub fn build_loader(env: &EnvConfig) -> Result<Loader, String> {
    let config = env.loader_config().map_err(|e| e.to_string())?;
    let transport = FsTransport::new(env.root.clone()).with_base_path(env.base_path.clone());
    let mut builder = Loader::builder(Arc::new(transport), Arc::new(LinkedHost::default()));

    if let Some(dir) = &env.cache_dir {
        let cache = FileCache::open(dir.clone()).map_err(|e| e.to_string())?;
        if let Some(timestamp) = &env.cache_timestamp {
            cache.handle_actuality(timestamp).map_err(|e| e.to_string())?;
        }
        builder = builder.cache(Arc::new(cache));
    }

    Ok(builder.config(config).build())
}

fn describe(value: &Export) -> String {
    match value.as_text() {
        Some(text) => text.to_string(),
        None => format!("{value:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::LogConfig;
    use std::path::Path;

    fn env(root: &Path, cache_dir: Option<&Path>) -> EnvConfig {
        EnvConfig {
            base_path: String::new(),
            root: root.to_path_buf(),
            cache_timestamp: Some("1".into()),
            cache_dir: cache_dir.map(Path::to_path_buf),
            libs_path: None,
            log: LogConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_loads_resource_from_root() {
        let root = tempfile::tempdir().unwrap();
        let templates = root.path().join("client/res/templates");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(templates.join("a.tpl"), "<div>{{name}}</div>").unwrap();

        let loader = build_loader(&env(root.path(), None)).unwrap();
        let value = loader.load("res!client/res/templates/a.tpl").await.unwrap();
        assert_eq!(describe(&value), "<div>{{name}}</div>");
    }

    #[tokio::test]
    async fn test_file_cache_is_attached() {
        let root = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("a.txt"), "a").unwrap();

        let loader = build_loader(&env(root.path(), Some(cache.path()))).unwrap();
        loader.load("res!a.txt").await.unwrap();
        assert!(std::fs::read_dir(cache.path()).unwrap().count() >= 2);
    }
}
