//! Client module loader.
//!
//! Resolves logical identifiers (`views/record/detail`, `crm:Foo/Bar`,
//! `res!client/res/templates/a.tpl`, `lib!moment`) to fetch paths, loads them
//! once per path no matter how many callers ask concurrently, and registers
//! the resulting values.
//!
//! # Pipeline
//!
//! - **Resolver**: identifier → path (`resolver`)
//! - **Loader**: memoization, single flight, joins (`loader`)
//! - **Cache**: persistent and URL-keyed response caches (`cache`)
//! - **Transport**: the actual fetch (`transport`)
//! - **Executor**: script content → definitions (`executor`)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use client_loader::executor::LinkedHost;
//! use client_loader::transport::FsTransport;
//! use client_loader::Loader;
//!
//! # async fn run() -> Result<(), client_loader::LoadError> {
//! let loader = Loader::new(
//!     Arc::new(FsTransport::new("/srv/espo")),
//!     Arc::new(LinkedHost::default()),
//! );
//! let template = loader.load("res!client/res/templates/record/detail.tpl").await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod libs;
pub mod loader;
pub mod registry;
pub mod resolver;
pub mod telemetry;
pub mod transport;

pub use error::LoadError;
pub use libs::{GlobalScope, LibEntry, LibsConfig};
pub use loader::{Loader, LoaderBuilder, LoaderConfig, Subject};
pub use registry::{Export, Registry};
pub use resolver::{resolve, resource_path, ResourceKind};
