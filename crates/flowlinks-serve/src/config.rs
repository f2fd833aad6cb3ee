//! Server configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use flowlinks_core::ProjectConfig;

/// Which backend stores link records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Firestore collection (production).
    Firestore,
    /// In-process map, optionally seeded from a JSON file.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("unknown link store '{other}' (expected firestore or memory)"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080").
    pub bind_addr: String,

    /// Public base URL of the link domain, used for canonical URLs.
    pub base_url: String,

    /// Site name used as fallback title and in `og:site_name`.
    pub site_name: String,

    /// Custom page template; the built-in one is used when unset.
    pub template_path: Option<PathBuf>,

    /// Link store backend.
    pub store: StoreBackend,

    /// Seed file for the memory store.
    pub seed_path: Option<PathBuf>,

    /// How long link lookups are cached. Zero disables caching.
    pub cache_ttl: Duration,

    /// Project and app identity.
    pub project: ProjectConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            base_url: "http://localhost:8080".to_string(),
            site_name: "Flow Links".to_string(),
            template_path: None,
            store: StoreBackend::Firestore,
            seed_path: None,
            cache_ttl: Duration::from_secs(60),
            project: ProjectConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `FLOWLINKS_BIND_ADDR`: Bind address (default: "0.0.0.0:$PORT", PORT defaulting to 8080)
    /// - `FLOWLINKS_BASE_URL`: Base URL for canonical links (default: "http://localhost:8080")
    /// - `FLOWLINKS_SITE_NAME`: Site name (default: "Flow Links")
    /// - `FLOWLINKS_TEMPLATE_PATH`: HTML template with `{{title}}`-style placeholders
    /// - `FLOWLINKS_STORE`: "firestore" or "memory" (default: "firestore")
    /// - `FLOWLINKS_SEED_PATH`: JSON array of links for the memory store
    /// - `FLOWLINKS_CACHE_TTL_SECS`: Lookup cache TTL (default: 60)
    ///
    /// plus the project variables read by [`ProjectConfig::from_env`].
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = match std::env::var("FLOWLINKS_BIND_ADDR") {
            Ok(addr) if !addr.trim().is_empty() => addr.trim().to_string(),
            _ => {
                let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
                format!("0.0.0.0:{}", port.trim())
            }
        };

        let base_url = env_non_empty("FLOWLINKS_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let site_name =
            env_non_empty("FLOWLINKS_SITE_NAME").unwrap_or_else(|| "Flow Links".to_string());

        let template_path = env_path("FLOWLINKS_TEMPLATE_PATH");
        let seed_path = env_path("FLOWLINKS_SEED_PATH");

        let store = std::env::var("FLOWLINKS_STORE")
            .unwrap_or_else(|_| "firestore".to_string())
            .parse()?;

        let cache_ttl_secs = match std::env::var("FLOWLINKS_CACHE_TTL_SECS") {
            Ok(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|e| anyhow::anyhow!("invalid FLOWLINKS_CACHE_TTL_SECS '{v}': {e}"))?,
            Err(_) => 60,
        };

        let project = ProjectConfig::from_env();

        tracing::info!(
            bind_addr = %bind_addr,
            base_url = %base_url,
            site_name = %site_name,
            store = ?store,
            cache_ttl_secs,
            project_id = %project.project_id,
            collection = %project.collection,
            "link server configuration loaded"
        );

        Ok(Self {
            bind_addr,
            base_url,
            site_name,
            template_path,
            store,
            seed_path,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            project,
        })
    }
}

/// Trimmed value of `key`; unset and blank are both `None`.
fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_non_empty(key).map(PathBuf::from)
}
