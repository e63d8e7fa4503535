//! Telemetry module tests.

use client_loader::cache::{MemoryCache, ResourceCache};
use client_loader::executor::{LinkTable, LinkedHost};
use client_loader::resolver::normalize_class_name;
use client_loader::telemetry::{
    record_cache_hit, record_fetch, record_load_failure, CacheSource, LoadSpan, LogConfig,
    LogError, LogFormat, SpanExt,
};
use client_loader::transport::MemoryTransport;
use client_loader::{Export, LoadError, Loader};
use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::Span;

/// Counts every counter increment, keyed as `name{label=value,...}`.
#[derive(Default)]
struct CountingRecorder {
    counters: Mutex<HashMap<String, Arc<AtomicU64>>>,
}

impl CountingRecorder {
    fn value(&self, id: &str) -> u64 {
        self.counters
            .lock()
            .unwrap()
            .get(id)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }
}

fn counter_id(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|label| format!("{}={}", label.key(), label.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

impl Recorder for CountingRecorder {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
        let counter = self
            .counters
            .lock()
            .unwrap()
            .entry(counter_id(key))
            .or_default()
            .clone();
        Counter::from_arc(counter)
    }

    fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}

/// Run `f` on a current-thread runtime with `recorder` installed, so spawned
/// flight tasks record into it too.
fn with_recorder<T>(recorder: &CountingRecorder, f: impl std::future::Future<Output = T>) -> T {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    metrics::with_local_recorder(recorder, || runtime.block_on(f))
}

/// Log output captured from a scoped subscriber.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .with_writer(move || writer.clone())
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    (value, captured.text())
}

// =============================================================================
// LogConfig Tests
// =============================================================================

#[test]
fn log_config_default_is_json() {
    let config = LogConfig::default();
    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, "info");
    assert!(config.output_path.is_none());
}

#[test]
fn log_config_with_output_path() {
    let config = LogConfig {
        output_path: Some(PathBuf::from("/tmp/client-loader.log")),
        ..Default::default()
    };
    assert_eq!(config.output_path, Some(PathBuf::from("/tmp/client-loader.log")));
}

#[test]
fn log_format_parses_case_insensitively() {
    assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
    assert!(matches!("yaml".parse::<LogFormat>(), Err(LogError::InvalidFormat(_))));
}

#[test]
fn log_error_display() {
    let err = LogError::InvalidFilter("bad".to_string());
    assert!(err.to_string().contains("bad"));
    assert_eq!(LogError::AlreadyInitialized.to_string(), "Subscriber already initialized");
}

// =============================================================================
// Span Tests
// =============================================================================

#[test]
fn span_ext_record_result_ok() {
    let span = Span::none();
    let result: Result<(), LoadError> = Ok(());
    span.record_result(&result);
}

#[test]
fn span_ext_record_result_err() {
    let span = LoadSpan::new("views/list", "client/src/views/list.js");
    let result: Result<(), LoadError> = Err(LoadError::Registration {
        name: "views/list".into(),
    });
    span.record_result(&result);
}

// =============================================================================
// Metrics Tests
// =============================================================================

#[test]
fn counters_without_recorder_are_no_ops() {
    record_fetch();
    record_cache_hit(CacheSource::Persistent);
    record_cache_hit(CacheSource::Response);
    record_load_failure("fetch");
}

#[test]
fn cache_source_labels() {
    assert_eq!(CacheSource::Persistent.as_str(), "cache");
    assert_eq!(CacheSource::Response.as_str(), "response_cache");
}

#[test]
fn failure_kinds_are_distinct() {
    let kinds = [
        LoadError::Resolution(String::new()).kind(),
        LoadError::Fetch { path: String::new(), reason: String::new() }.kind(),
        LoadError::Registration { name: String::new() }.kind(),
        LoadError::Evaluation { name: String::new(), reason: String::new() }.kind(),
        LoadError::ExportMissing { name: String::new(), location: String::new() }.kind(),
        LoadError::Circular { chain: String::new() }.kind(),
        LoadError::Aborted { path: String::new() }.kind(),
    ];
    let unique: std::collections::HashSet<_> = kinds.iter().collect();
    assert_eq!(unique.len(), kinds.len());
}

#[test]
fn loads_increment_fetch_and_cache_hit_counters() {
    let recorder = CountingRecorder::default();
    let transport = Arc::new(
        MemoryTransport::new().with("client/src/x.js", r#"{"op":"define","factory":"x"}"#),
    );
    let table = Arc::new(LinkTable::new());
    table.link("x", |_| Some(Export::text("x")));
    let cache = Arc::new(MemoryCache::new(Some("1".into())));

    let build = || {
        Loader::builder(transport.clone(), Arc::new(LinkedHost::new(table.clone())))
            .cache(cache.clone() as Arc<dyn ResourceCache>)
            .build()
    };
    with_recorder(&recorder, async {
        build().load("x").await.unwrap();
        build().load("x").await.unwrap();
        build().load("missing").await.unwrap_err();
    });

    assert_eq!(recorder.value("loader_fetch_total"), 2);
    assert_eq!(recorder.value("loader_cache_hit_total{source=cache}"), 1);
    assert_eq!(recorder.value("loader_cache_hit_total{source=response_cache}"), 0);
    assert_eq!(recorder.value("loader_load_failure_total{kind=fetch}"), 1);
}

#[test]
fn memoized_load_records_nothing() {
    let recorder = CountingRecorder::default();
    let transport = Arc::new(
        MemoryTransport::new().with("client/src/x.js", r#"{"op":"define","factory":"x"}"#),
    );
    let table = Arc::new(LinkTable::new());
    table.link("x", |_| Some(Export::text("x")));
    let loader = Loader::new(transport, Arc::new(LinkedHost::new(table)));

    with_recorder(&recorder, async {
        loader.load("x").await.unwrap();
        loader.load("x").await.unwrap();
    });

    assert_eq!(recorder.value("loader_fetch_total"), 1);
    assert_eq!(recorder.value("loader_cache_hit_total{source=cache}"), 0);
}

// =============================================================================
// Log Event Tests
// =============================================================================

#[test]
fn dotted_class_name_logs_deprecation_warning() {
    let (name, logs) = capture_logs(|| normalize_class_name("Views.Record.Detail"));
    assert_eq!(name, "views/record/detail");
    assert!(logs.contains("WARN"), "got {logs}");
    assert!(logs.contains("should use slashes"), "got {logs}");
    assert!(logs.contains("Views.Record.Detail"), "got {logs}");
}

#[test]
fn slash_class_name_logs_nothing() {
    let (_, logs) = capture_logs(|| normalize_class_name("views/record/detail"));
    assert!(logs.is_empty(), "got {logs}");
}
