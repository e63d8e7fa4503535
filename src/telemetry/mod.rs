//! Telemetry for the client loader.
//!
//! Structured logging, load spans and metrics counters. Counters go through
//! the `metrics` facade and are no-ops until the host installs a recorder.

mod logging;
mod metrics;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use metrics::{record_cache_hit, record_fetch, record_load_failure, CacheSource};
pub use spans::{LoadSpan, SpanExt};
