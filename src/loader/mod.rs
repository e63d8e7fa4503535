//! Load coordinator.
//!
//! Turns logical identifiers into loaded values. Concurrent loads of the same
//! subject share one flight; resolved values are memoized per loader instance.
//!
//! ```text
//! load(name) → parse → memo? → flight table → cache → transport → host → registry
//! ```
//!
//! Every flight runs as its own tokio task, so a load that has started always
//! finishes and populates the registry, even when all of its callers go away.

mod flight;
mod request;

pub use request::Subject;

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, warn, Instrument, Span};

use crate::cache::{ResourceCache, ResponseCache, APP_NAMESPACE};
use crate::error::LoadError;
use crate::executor::{Definition, EvalScope, Factory, ScriptHost};
use crate::libs::{GlobalScope, LibsConfig, ROOT_SCOPE};
use crate::registry::{Export, Registry};
use crate::resolver::{normalize_class_name, Identifier};
use crate::telemetry::{
    record_cache_hit, record_fetch, record_load_failure, CacheSource, LoadSpan, SpanExt,
};
use crate::transport::{with_cache_busting, Transport};
use flight::{Flight, FlightGuard, FlightKey, FlightResult, FlightTable, Joined, LOAD_CHAIN};
use request::LoadRequest;

/// Loader settings.
#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    /// Prefix prepended to every fetch path to form the URL.
    pub base_path: String,
    /// Cache generation token; appended to URLs as `r=<token>`.
    pub cache_timestamp: Option<String>,
    /// Initial third-party library configuration.
    pub libs: LibsConfig,
}

/// Builder for [`Loader`].
pub struct LoaderBuilder {
    transport: Arc<dyn Transport>,
    host: Arc<dyn ScriptHost>,
    config: LoaderConfig,
    cache: Option<Arc<dyn ResourceCache>>,
    response_cache: Option<Arc<dyn ResponseCache>>,
}

impl LoaderBuilder {
    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Persistent cache consulted before the transport.
    pub fn cache(mut self, cache: Arc<dyn ResourceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// URL-keyed response cache. Suppresses the persistent cache.
    pub fn response_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.response_cache = Some(cache);
        self
    }

    pub fn build(self) -> Loader {
        Loader {
            inner: Arc::new(LoaderInner {
                base_path: self.config.base_path,
                cache_timestamp: self.config.cache_timestamp,
                transport: self.transport,
                host: self.host,
                cache: self.cache,
                response_cache: self.response_cache,
                libs: RwLock::new(self.config.libs),
                classes: Registry::new(),
                data: Registry::new(),
                globals: GlobalScope::new(),
                flights: Arc::new(FlightTable::new()),
            }),
        }
    }
}

struct LoaderInner {
    base_path: String,
    cache_timestamp: Option<String>,
    transport: Arc<dyn Transport>,
    host: Arc<dyn ScriptHost>,
    cache: Option<Arc<dyn ResourceCache>>,
    response_cache: Option<Arc<dyn ResponseCache>>,
    libs: RwLock<LibsConfig>,
    /// Class name → value.
    classes: Registry,
    /// `res!…` / `lib!…` identifier → value.
    data: Registry,
    globals: GlobalScope,
    flights: Arc<FlightTable>,
}

/// Module loader. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Loader {
    inner: Arc<LoaderInner>,
}

impl Loader {
    pub fn builder(transport: Arc<dyn Transport>, host: Arc<dyn ScriptHost>) -> LoaderBuilder {
        LoaderBuilder {
            transport,
            host,
            config: LoaderConfig::default(),
            cache: None,
            response_cache: None,
        }
    }

    /// Loader with default settings and no caches.
    pub fn new(transport: Arc<dyn Transport>, host: Arc<dyn ScriptHost>) -> Self {
        Self::builder(transport, host).build()
    }

    /// Load one identifier.
    ///
    /// Already loaded names resolve on the first poll without touching the
    /// transport. Otherwise the caller joins the flight for the resolved path,
    /// starting it if none is running.
    pub fn load(&self, name: &str) -> BoxFuture<'static, Result<Export, LoadError>> {
        let loader = self.clone();
        let name = name.to_string();
        async move {
            let request = loader.prepare(Identifier::parse(&name)?);
            if let Some(value) = loader.memoized(&request) {
                return Ok(value);
            }

            let key = request.flight_key();
            let chain = LOAD_CHAIN.try_with(Clone::clone).unwrap_or_default();
            if chain.contains(&key) {
                let mut cycle = chain;
                cycle.push(key);
                let cycle: Vec<_> = cycle.iter().map(ToString::to_string).collect();
                return Err(LoadError::Circular { chain: cycle.join(" -> ") });
            }

            let path = request.path.clone();
            let joined = loader.inner.flights.join(
                &key,
                || loader.memoized(&request),
                || loader.start_flight(request.clone(), chain),
            );
            match joined {
                Joined::Ready(value) => Ok(value),
                Joined::Attached(flight) => {
                    debug!(name = %name, path = %path, "Attached to running load");
                    flight.await
                }
                Joined::Started(flight) => {
                    debug!(name = %name, path = %path, "Started load");
                    flight.await
                }
            }
        }
        .boxed()
    }

    /// Load every name in `subject`; values come back in request order.
    ///
    /// An empty subject completes immediately. The first failing member fails
    /// the whole join; members already in flight still run to completion.
    pub fn require(
        &self,
        subject: impl Into<Subject>,
    ) -> BoxFuture<'static, Result<Vec<Export>, LoadError>> {
        let names = subject.into().into_names();
        let loader = self.clone();
        async move {
            match names.as_slice() {
                [] => Ok(Vec::new()),
                [name] => loader.load(name).await.map(|value| vec![value]),
                names => try_join_all(names.iter().map(|name| loader.load(name))).await,
            }
        }
        .boxed()
    }

    /// Register a statically linked module.
    ///
    /// Dependencies are loaded first and passed to `factory` in order.
    /// There is no loading subject outside a load, so `subject` is required.
    pub async fn define<F>(
        &self,
        subject: Option<&str>,
        deps: Vec<String>,
        factory: F,
    ) -> Result<Export, LoadError>
    where
        F: Fn(&[Export]) -> Option<Export> + Send + Sync + 'static,
    {
        let Some(subject) = subject else {
            return Err(LoadError::Resolution(
                "anonymous define outside of a load".into(),
            ));
        };
        let subject = normalize_class_name(subject);
        self.link(&subject, deps, Arc::new(factory), None).await
    }

    /// Merge library settings. Affects loads that have not resolved yet.
    pub fn add_libs_config(&self, libs: LibsConfig) {
        self.inner.libs.write().merge(libs);
    }

    /// Fetch and evaluate a plain script without expecting a registration.
    ///
    /// The persistent cache is read under `url`; fetched bodies are not stored.
    pub async fn load_lib(&self, url: &str) -> Result<(), LoadError> {
        let cached = match (&self.inner.cache, &self.inner.response_cache) {
            (Some(cache), None) => cache.get(APP_NAMESPACE, url),
            _ => None,
        };
        let body = match cached {
            Some(body) => {
                record_cache_hit(CacheSource::Persistent);
                body
            }
            None => {
                record_fetch();
                self.inner
                    .transport
                    .fetch(&self.url(url))
                    .await
                    .map_err(|e| LoadError::Fetch {
                        path: url.to_string(),
                        reason: e.to_string(),
                    })?
            }
        };

        let definitions = self.evaluate(url, &body, None)?;
        self.link_all(definitions, url).await
    }

    /// Fetch path for `name`, honoring the libs configuration.
    pub fn resolve(&self, name: &str) -> Result<String, LoadError> {
        Ok(self.prepare(Identifier::parse(name)?).path)
    }

    /// Loaded value for `name`, if any. Never starts a load.
    pub fn get(&self, name: &str) -> Option<Export> {
        let request = self.prepare(Identifier::parse(name).ok()?);
        self.memoized(&request)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether a flight for `name` is outstanding.
    pub fn in_flight(&self, name: &str) -> bool {
        match Identifier::parse(name) {
            Ok(id) => self.inner.flights.contains(&self.prepare(id).flight_key()),
            Err(_) => false,
        }
    }

    pub fn flight_count(&self) -> usize {
        self.inner.flights.len()
    }

    /// Registered class names, sorted.
    pub fn classes(&self) -> Vec<String> {
        self.inner.classes.names()
    }

    pub fn globals(&self) -> &GlobalScope {
        &self.inner.globals
    }

    fn prepare(&self, id: Identifier) -> LoadRequest {
        LoadRequest::new(id, &self.inner.libs.read())
    }

    fn memoized(&self, request: &LoadRequest) -> Option<Export> {
        match &request.id {
            Identifier::Class { name } => self.inner.classes.get(name),
            Identifier::Library { .. } => self.inner.data.get(&request.key).or_else(|| {
                let (to, exports_as) = request.exports.as_ref()?;
                self.inner.globals.get(to, exports_as)
            }),
            Identifier::Resource { .. } => self.inner.data.get(&request.key),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.inner.base_path,
            with_cache_busting(path, self.inner.cache_timestamp.as_deref())
        )
    }

    fn start_flight(&self, request: LoadRequest, mut chain: Vec<FlightKey>) -> Flight {
        let path = request.path.clone();
        chain.push(request.flight_key());
        let handle = tokio::spawn(LOAD_CHAIN.scope(chain, self.clone().run_flight(request)));
        async move {
            handle
                .await
                .unwrap_or_else(|_| Err(LoadError::Aborted { path }))
        }
        .boxed()
        .shared()
    }

    async fn run_flight(self, request: LoadRequest) -> FlightResult {
        let _guard = FlightGuard::new(self.inner.flights.clone(), request.flight_key());
        let span = LoadSpan::new(&request.key, &request.path);

        let result = async {
            let body = self.fetch(&request).await?;
            self.handle_content(&request, body).await
        }
        .instrument(span.clone())
        .await;

        span.record_result(&result);
        if let Err(e) = &result {
            record_load_failure(e.kind());
        }
        result
    }

    async fn fetch(&self, request: &LoadRequest) -> Result<String, LoadError> {
        let span = Span::current();

        if let (Some(cache), None) = (&self.inner.cache, &self.inner.response_cache) {
            if let Some(payload) = cache.get(APP_NAMESPACE, &request.key) {
                debug!(name = %request.key, "Cache hit");
                span.record("source", CacheSource::Persistent.as_str());
                record_cache_hit(CacheSource::Persistent);
                return Ok(payload);
            }
            debug!(name = %request.key, "Cache miss");
        }

        let url = self.url(&request.path);
        if let Some(responses) = &self.inner.response_cache {
            if let Some(body) = responses.match_url(&url).await {
                debug!(url = %url, "Response cache hit");
                span.record("source", CacheSource::Response.as_str());
                record_cache_hit(CacheSource::Response);
                return Ok(body);
            }
        }

        span.record("source", "network");
        record_fetch();
        let body = self
            .inner
            .transport
            .fetch(&url)
            .await
            .map_err(|e| LoadError::Fetch {
                path: request.path.clone(),
                reason: e.to_string(),
            })?;

        match (&self.inner.response_cache, &self.inner.cache) {
            (Some(responses), _) => responses.put(&url, &body).await,
            (None, Some(cache)) if !request.no_app_cache => {
                cache.set(APP_NAMESPACE, &request.key, &body)
            }
            _ => {}
        }

        Ok(body)
    }

    async fn handle_content(&self, request: &LoadRequest, body: String) -> Result<Export, LoadError> {
        match &request.id {
            Identifier::Resource { .. } => {
                let value = Export::text(body);
                self.inner.data.insert(request.key.clone(), value.clone());
                Ok(value)
            }
            Identifier::Class { name } => {
                let definitions = self.evaluate(&request.key, &body, Some(name.clone()))?;
                self.link_all(definitions, &request.key).await?;

                self.inner.classes.get(name).ok_or_else(|| {
                    self.invalidate(&request.key);
                    error!(name = %name, path = %request.path, "Script did not register its class");
                    LoadError::Registration { name: name.clone() }
                })
            }
            Identifier::Library { name } => {
                let definitions = self.evaluate(&request.key, &body, None)?;
                self.link_all(definitions, &request.key).await?;

                let (to, exports_as) = request
                    .exports
                    .clone()
                    .unwrap_or_else(|| (ROOT_SCOPE.to_string(), name.clone()));
                let value = self.inner.globals.get(&to, &exports_as).ok_or_else(|| {
                    LoadError::ExportMissing {
                        name: name.clone(),
                        location: GlobalScope::location(&to, &exports_as),
                    }
                })?;
                self.inner.data.insert(request.key.clone(), value.clone());
                Ok(value)
            }
        }
    }

    /// Run the script host over `body`. Failures clear the cache entry.
    fn evaluate(
        &self,
        cache_key: &str,
        body: &str,
        loading: Option<String>,
    ) -> Result<Vec<Definition>, LoadError> {
        let mut scope = EvalScope::new(loading, &self.inner.globals);
        match self.inner.host.evaluate(body, &mut scope) {
            Ok(()) => Ok(scope.into_definitions()),
            Err(e) => {
                self.invalidate(cache_key);
                Err(LoadError::Evaluation {
                    name: cache_key.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn link_all(&self, definitions: Vec<Definition>, cache_key: &str) -> Result<(), LoadError> {
        for definition in definitions {
            let Some(subject) = definition.subject else {
                warn!(source = %cache_key, "Ignoring anonymous define with no loading subject");
                continue;
            };
            self.link(&subject, definition.deps, definition.factory, Some(cache_key))
                .await?;
        }
        Ok(())
    }

    /// Resolve `deps`, build the value and register it under `subject`.
    async fn link(
        &self,
        subject: &str,
        deps: Vec<String>,
        factory: Factory,
        cache_key: Option<&str>,
    ) -> Result<Export, LoadError> {
        let values = self.require(deps).await?;
        match factory(&values) {
            Some(value) => {
                self.inner.classes.insert(subject, value.clone());
                Ok(value)
            }
            None => {
                if let Some(key) = cache_key {
                    self.invalidate(key);
                }
                error!(name = %subject, "Factory produced no value");
                Err(LoadError::Registration {
                    name: subject.to_string(),
                })
            }
        }
    }

    fn invalidate(&self, cache_key: &str) {
        if let Some(cache) = &self.inner.cache {
            cache.clear(APP_NAMESPACE, cache_key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{LinkTable, LinkedHost};
    use crate::transport::MemoryTransport;

    fn setup(transport: MemoryTransport) -> (Loader, Arc<MemoryTransport>, Arc<LinkTable>) {
        let transport = Arc::new(transport);
        let table = Arc::new(LinkTable::new());
        let host = Arc::new(LinkedHost::new(table.clone()));
        (Loader::new(transport.clone(), host), transport, table)
    }

    #[tokio::test]
    async fn test_loads_class_with_dependency() {
        let (loader, transport, table) = setup(
            MemoryTransport::new()
                .with("client/src/views/list.js", r#"{"op":"define","deps":["views/base"],"factory":"list"}"#)
                .with("client/src/views/base.js", r#"{"op":"define","factory":"base"}"#),
        );
        table.link("base", |_| Some(Export::text("base")));
        table.link("list", |deps| {
            let base = deps.first()?.as_text()?;
            Some(Export::text(format!("list<{base}>")))
        });

        let value = loader.load("views/list").await.unwrap();
        assert_eq!(value.as_text(), Some("list<base>"));
        assert!(loader.is_loaded("views/base"));
        assert_eq!(transport.total_fetches(), 2);
        assert_eq!(loader.flight_count(), 0);
    }

    #[tokio::test]
    async fn test_resource_loads_as_text() {
        let (loader, _, _) = setup(MemoryTransport::new().with("client/res/templates/a.tpl", "<p>"));
        let value = loader.load("res!client/res/templates/a.tpl").await.unwrap();
        assert_eq!(value.as_text(), Some("<p>"));
        assert!(loader.get("res!client/res/templates/a.tpl").is_some());
    }

    #[tokio::test]
    async fn test_missing_registration() {
        let (loader, _, table) = setup(
            MemoryTransport::new().with("client/src/a.js", r#"{"op":"define","name":"b","factory":"f"}"#),
        );
        table.link("f", |_| Some(Export::object(())));

        let err = loader.load("a").await.unwrap_err();
        assert_eq!(err, LoadError::Registration { name: "a".into() });
        assert!(loader.is_loaded("b"));
    }

    #[tokio::test]
    async fn test_define_requires_subject() {
        let (loader, _, _) = setup(MemoryTransport::new());
        let err = loader.define(None, vec![], |_| Some(Export::object(()))).await;
        assert!(matches!(err, Err(LoadError::Resolution(_))));

        loader
            .define(Some("Views.Static"), vec![], |_| Some(Export::object(1u8)))
            .await
            .unwrap();
        assert!(loader.is_loaded("views/static"));
    }

    #[tokio::test]
    async fn test_circular_dependency_fails() {
        let (loader, _, table) = setup(
            MemoryTransport::new()
                .with("client/src/a.js", r#"{"op":"define","deps":["b"],"factory":"f"}"#)
                .with("client/src/b.js", r#"{"op":"define","deps":["a"],"factory":"f"}"#),
        );
        table.link("f", |_| Some(Export::object(())));

        let err = loader.load("a").await.unwrap_err();
        assert_eq!(
            err,
            LoadError::Circular {
                chain: "client/src/a.js -> client/src/b.js -> client/src/a.js".into()
            }
        );
        assert_eq!(loader.flight_count(), 0);
    }

    #[test]
    fn test_resolve_uses_libs_config() {
        let (loader, _, _) = setup(MemoryTransport::new());
        assert_eq!(loader.resolve("lib!moment").unwrap(), "moment");

        loader.add_libs_config(
            LibsConfig::from_json(r#"{"moment": {"path": "client/lib/moment.js"}}"#).unwrap(),
        );
        assert_eq!(loader.resolve("lib!moment").unwrap(), "client/lib/moment.js");
        assert_eq!(loader.resolve("Views.List").unwrap(), "client/src/views/list.js");
        assert!(loader.resolve("").is_err());
    }
}
