//! Link persistence.
//!
//! The redirect server only ever needs a point lookup by path; the
//! provisioning run writes the default record. Both go through
//! [`LinkStore`] so the backing database can be swapped for tests and
//! local development.

mod firestore;
mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::link::FlowLink;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

/// Storage backend for link records.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Find the link stored for a normalized path.
    async fn find_by_path(&self, path: &str) -> Result<Option<FlowLink>>;

    /// Insert or replace a link, returning it as stored (with its id).
    async fn put(&self, link: FlowLink) -> Result<FlowLink>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}
