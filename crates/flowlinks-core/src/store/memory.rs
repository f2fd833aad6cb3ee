//! In-memory link store for local development and tests.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::LinkStore;
use crate::error::Result;
use crate::link::{FlowLink, normalize_path};

/// Links held in a map keyed by normalized path.
#[derive(Default)]
pub struct MemoryStore {
    links: RwLock<HashMap<String, FlowLink>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `links`.
    pub fn with_links(links: impl IntoIterator<Item = FlowLink>) -> Self {
        let store = Self::new();
        {
            let mut map = store.links.write();
            for link in links {
                let link = prepare(link);
                map.insert(link.path.clone(), link);
            }
        }
        store
    }

    /// Load a JSON array of links from a file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let links: Vec<FlowLink> = serde_json::from_str(&data)?;
        tracing::info!(
            path = %path.as_ref().display(),
            count = links.len(),
            "loaded seed links"
        );
        Ok(Self::with_links(links))
    }

    /// Number of stored links.
    pub fn len(&self) -> usize {
        self.links.read().len()
    }

    /// Whether the store holds no links.
    pub fn is_empty(&self) -> bool {
        self.links.read().is_empty()
    }
}

fn prepare(mut link: FlowLink) -> FlowLink {
    link.path = normalize_path(&link.path);
    link.id = Some(link.document_id());
    link
}

#[async_trait]
impl LinkStore for MemoryStore {
    async fn find_by_path(&self, path: &str) -> Result<Option<FlowLink>> {
        Ok(self.links.read().get(path).cloned())
    }

    async fn put(&self, link: FlowLink) -> Result<FlowLink> {
        let link = prepare(link);
        self.links.write().insert(link.path.clone(), link.clone());
        Ok(link)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
