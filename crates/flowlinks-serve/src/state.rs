//! Application state shared across all request handlers.

use std::sync::Arc;

use flowlinks_core::{FirestoreStore, FlowLink, LinkStore, MemoryStore, provider_from_env};
use moka::future::Cache;

use crate::config::{Config, StoreBackend};
use crate::render::template::Template;

/// Cache of store lookups keyed by normalized path.
///
/// Misses are cached as `None` so unknown paths don't hit the store on
/// every crawler retry.
pub type LinkCache = Cache<String, Option<FlowLink>>;

/// Maximum number of cached lookups.
const CACHE_CAPACITY: u64 = 10_000;

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Link record storage.
    pub store: Arc<dyn LinkStore>,

    /// Application configuration.
    pub config: Arc<Config>,

    /// Page template for resolved links.
    pub template: Arc<Template>,

    /// Lookup cache; `None` when caching is disabled.
    pub cache: Option<LinkCache>,
}

impl AppState {
    /// Create application state around an existing store and template.
    pub fn new(config: Config, store: Arc<dyn LinkStore>, template: Template) -> Self {
        let cache = (!config.cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(config.cache_ttl)
                .build()
        });

        tracing::info!(
            store = store.backend(),
            cache_capacity = CACHE_CAPACITY,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            "application state initialized"
        );

        Self {
            store,
            config: Arc::new(config),
            template: Arc::new(template),
            cache,
        }
    }

    /// Build the store and template described by the configuration.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn LinkStore> = match config.store {
            StoreBackend::Firestore => {
                if config.project.project_id.is_empty() {
                    anyhow::bail!("PROJECT_ID is required for the firestore link store");
                }
                let client = reqwest::Client::builder()
                    .timeout(flowlinks_core::HTTP_TIMEOUT)
                    .build()?;
                Arc::new(FirestoreStore::new(
                    client.clone(),
                    provider_from_env(client),
                    config.project.project_id.clone(),
                    config.project.collection.clone(),
                ))
            }
            StoreBackend::Memory => match &config.seed_path {
                Some(path) => Arc::new(MemoryStore::from_json_file(path)?),
                None => Arc::new(MemoryStore::new()),
            },
        };

        let template = match &config.template_path {
            Some(path) => Template::from_file(path)?,
            None => Template::builtin(),
        };

        Ok(Self::new(config, store, template))
    }
}
