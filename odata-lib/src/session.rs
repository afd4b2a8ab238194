//! Session: service root, settings and the once-per-session schema load

use std::fmt;
use std::sync::Arc;

use log::debug;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::Settings;
use crate::cache::CacheConfig;
use crate::cache::CacheProvider;
use crate::cache::CachedValue;
use crate::command::FluentCommand;
use crate::error::Error;
use crate::metadata::Schema;
use crate::metadata::SchemaSource;
use crate::model::ODataEntity;

/// A connection to one OData service.
///
/// Sessions are cheap to clone (uses `Arc` internally) and can be shared
/// across threads. The service schema is loaded at most once per session,
/// the first time a command is resolved asynchronously.
///
/// # Example
///
/// ```
/// use odata_lib::Session;
/// use odata_lib::metadata::{EntityType, Schema};
///
/// let schema = Schema::new("NorthwindModel")
///     .entity_type(EntityType::new("Product").key(["ProductID"]).property("ProductID"))
///     .entity_set("Products", "Product");
///
/// let session = Session::builder()
///     .url("https://services.odata.org/V4/Northwind/Northwind.svc")
///     .schema(schema)
///     .build()?;
///
/// let text = session.for_collection("Products").key(1).command_text()?;
/// assert_eq!(text, "Products(1)");
/// # Ok::<(), odata_lib::error::Error>(())
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    base_url: Url,
    settings: Settings,
    source: Arc<dyn SchemaSource>,
    schema: OnceCell<Arc<Schema>>,
    cache: Option<Arc<dyn CacheProvider>>,
    cache_config: CacheConfig,
}

impl Session {
    /// Creates a new builder for constructing a session.
    pub fn builder() -> SessionBuilder<Missing, Missing> {
        SessionBuilder::new()
    }

    /// Returns the service root URL, always ending with `/`.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Returns the session settings.
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Returns the schema if it has been loaded.
    pub fn loaded_metadata(&self) -> Option<Arc<Schema>> {
        self.inner.schema.get().cloned()
    }

    /// Returns the service schema, loading it on first use.
    ///
    /// Concurrent callers share one load. A failed or cancelled load is not
    /// remembered, so the next call tries again.
    pub async fn metadata(&self, cancel: &CancellationToken) -> Result<Arc<Schema>, Error> {
        if let Some(schema) = self.inner.schema.get() {
            return Ok(schema.clone());
        }
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            schema = self.inner.schema.get_or_try_init(|| self.load_schema()) => schema.cloned(),
        }
    }

    async fn load_schema(&self) -> Result<Arc<Schema>, Error> {
        let cache_key = format!("schema:{}", self.inner.base_url);
        let cache = self
            .inner
            .cache
            .as_ref()
            .filter(|_| !self.inner.cache_config.is_disabled());

        if let Some(cache) = cache {
            if let Some(cached) = cache.get(&cache_key).await {
                match bincode::deserialize::<Schema>(&cached.data) {
                    Ok(schema) => {
                        debug!("Loaded schema for {} from cache", self.inner.base_url);
                        return Ok(Arc::new(schema.with_name_match(self.inner.settings.name_match)));
                    }
                    Err(e) => debug!("Discarding undecodable cached schema: {}", e),
                }
            }
        }

        let schema = self
            .inner
            .source
            .load()
            .await?
            .with_name_match(self.inner.settings.name_match);
        debug!(
            "Loaded schema for {}: {} entity types, {} entity sets",
            self.inner.base_url,
            schema.entity_types.len(),
            schema.entity_sets.len()
        );

        if let Some(cache) = cache {
            match bincode::serialize(&schema) {
                Ok(data) => {
                    let value = CachedValue::with_ttl(data, self.inner.cache_config.metadata_ttl);
                    cache.set(&cache_key, value).await;
                }
                Err(e) => debug!("Schema not cached: {}", e),
            }
        }
        Ok(Arc::new(schema))
    }

    /// Starts a command on a collection.
    ///
    /// `"Transport/Ships"` targets `Transport` narrowed to derived type `Ships`.
    pub fn for_collection(&self, name: &str) -> FluentCommand {
        FluentCommand::new(self.clone()).for_collection(name)
    }

    /// Starts a command on the collection of entity type `T`.
    pub fn for_entity<T: ODataEntity>(&self) -> FluentCommand {
        FluentCommand::new(self.clone()).for_entity::<T>()
    }

    /// Starts an unbound function call.
    pub fn function(&self, name: &str) -> FluentCommand {
        FluentCommand::new(self.clone()).function(name)
    }

    /// Starts an unbound action call.
    pub fn action(&self, name: &str) -> FluentCommand {
        FluentCommand::new(self.clone()).action(name)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.inner.base_url.as_str())
            .field("settings", &self.inner.settings)
            .field("schema_loaded", &self.inner.schema.initialized())
            .finish()
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`Session`].
///
/// Uses the typestate pattern to ensure required fields are set at compile time.
///
/// # Required Fields
///
/// - `url` - The service root URL
/// - `schema_source` - A [`SchemaSource`] implementation (or `schema` for a
///   schema already in memory)
pub struct SessionBuilder<U, S> {
    url: U,
    source: S,
    preloaded: Option<Arc<Schema>>,
    settings: Settings,
    cache: Option<Arc<dyn CacheProvider>>,
    cache_config: CacheConfig,
}

impl SessionBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            source: Missing,
            preloaded: None,
            settings: Settings::default(),
            cache: None,
            cache_config: CacheConfig::default(),
        }
    }
}

impl Default for SessionBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SessionBuilder<Missing, S> {
    /// Sets the service root URL.
    pub fn url(self, url: impl Into<String>) -> SessionBuilder<Set<String>, S> {
        SessionBuilder {
            url: Set(url.into()),
            source: self.source,
            preloaded: self.preloaded,
            settings: self.settings,
            cache: self.cache,
            cache_config: self.cache_config,
        }
    }
}

impl<U> SessionBuilder<U, Missing> {
    /// Sets the source the schema is loaded from on first use.
    pub fn schema_source<T: SchemaSource + 'static>(
        self,
        source: T,
    ) -> SessionBuilder<U, Set<Arc<dyn SchemaSource>>> {
        SessionBuilder {
            url: self.url,
            source: Set(Arc::new(source) as Arc<dyn SchemaSource>),
            preloaded: self.preloaded,
            settings: self.settings,
            cache: self.cache,
            cache_config: self.cache_config,
        }
    }

    /// Uses a schema already in memory; commands resolve synchronously
    /// right away.
    pub fn schema(self, schema: Schema) -> SessionBuilder<U, Set<Arc<dyn SchemaSource>>> {
        let preloaded = Arc::new(schema.with_name_match(self.settings.name_match));
        SessionBuilder {
            url: self.url,
            source: Set(Arc::new(Schema::clone(&preloaded)) as Arc<dyn SchemaSource>),
            preloaded: Some(preloaded),
            settings: self.settings,
            cache: self.cache,
            cache_config: self.cache_config,
        }
    }
}

impl<U, S> SessionBuilder<U, S> {
    /// Sets protocol and name-matching settings.
    pub fn settings(mut self, settings: Settings) -> Self {
        if let Some(schema) = self.preloaded.take() {
            let schema = Arc::unwrap_or_clone(schema).with_name_match(settings.name_match);
            self.preloaded = Some(Arc::new(schema));
        }
        self.settings = settings;
        self
    }

    /// Sets a cache shared by sessions to avoid reloading schemas.
    pub fn cache<C: CacheProvider + 'static>(mut self, cache: C) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Sets an already shared cache.
    pub fn shared_cache(mut self, cache: Arc<dyn CacheProvider>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the cache TTL policy.
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }
}

impl SessionBuilder<Set<String>, Set<Arc<dyn SchemaSource>>> {
    /// Builds the [`Session`].
    ///
    /// Fails if the URL cannot be parsed.
    pub fn build(self) -> Result<Session, Error> {
        let mut url = self.url.0;
        if !url.ends_with('/') {
            url.push('/');
        }
        let base_url = Url::parse(&url)?;

        Ok(Session {
            inner: Arc::new(SessionInner {
                base_url,
                settings: self.settings,
                source: self.source.0,
                schema: OnceCell::new_with(self.preloaded),
                cache: self.cache,
                cache_config: self.cache_config,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::InMemoryCache;
    use crate::metadata::EntityType;
    use crate::metadata::NameMatchPolicy;

    fn schema() -> Schema {
        Schema::new("NorthwindModel")
            .entity_type(EntityType::new("Product").key(["ProductID"]).property("ProductID"))
            .entity_set("Products", "Product")
    }

    #[derive(Default)]
    struct CountingSource {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl SchemaSource for Arc<CountingSource> {
        async fn load(&self) -> Result<Schema, Error> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(schema())
        }
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let session = Session::builder()
            .url("https://example.com/odata")
            .schema(schema())
            .build()
            .unwrap();
        assert_eq!(session.base_url().as_str(), "https://example.com/odata/");
    }

    #[test]
    fn test_invalid_url() {
        let result = Session::builder().url("not a url").schema(schema()).build();
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_settings_apply_to_preloaded_schema() {
        let session = Session::builder()
            .url("https://example.com/")
            .schema(schema())
            .settings(Settings::new().with_name_match(NameMatchPolicy::Exact))
            .build()
            .unwrap();
        let loaded = session.loaded_metadata().unwrap();
        assert_eq!(loaded.name_match, NameMatchPolicy::Exact);
    }

    #[tokio::test]
    async fn test_schema_loads_once() {
        let source = Arc::new(CountingSource::default());
        let session = Session::builder()
            .url("https://example.com/")
            .schema_source(source.clone())
            .build()
            .unwrap();
        assert!(session.loaded_metadata().is_none());

        let cancel = CancellationToken::new();
        session.metadata(&cancel).await.unwrap();
        session.metadata(&cancel).await.unwrap();
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert!(session.loaded_metadata().is_some());
    }

    #[tokio::test]
    async fn test_cancelled_before_load() {
        let source = Arc::new(CountingSource::default());
        let session = Session::builder()
            .url("https://example.com/")
            .schema_source(source.clone())
            .build()
            .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(session.metadata(&cancel).await, Err(Error::Cancelled)));
        assert_eq!(source.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_shared_between_sessions() {
        let cache: Arc<dyn CacheProvider> = Arc::new(InMemoryCache::new());
        let source = Arc::new(CountingSource::default());
        let cancel = CancellationToken::new();

        for _ in 0..2 {
            let session = Session::builder()
                .url("https://example.com/")
                .schema_source(source.clone())
                .shared_cache(cache.clone())
                .build()
                .unwrap();
            let loaded = session.metadata(&cancel).await.unwrap();
            assert_eq!(loaded.entity_sets.len(), 1);
        }
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_cache_config_skips_cache() {
        let cache: Arc<dyn CacheProvider> = Arc::new(InMemoryCache::new());
        let source = Arc::new(CountingSource::default());
        let cancel = CancellationToken::new();

        for _ in 0..2 {
            let session = Session::builder()
                .url("https://example.com/")
                .schema_source(source.clone())
                .shared_cache(cache.clone())
                .cache_config(CacheConfig::no_cache())
                .build()
                .unwrap();
            session.metadata(&cancel).await.unwrap();
        }
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }
}
