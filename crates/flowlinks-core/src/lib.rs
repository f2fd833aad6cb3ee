//! Core types and shared clients for the flowlinks deep-link service.
//!
//! This crate provides:
//! - The [`FlowLink`] record and path normalization
//! - Project and app identity configuration ([`ProjectConfig`])
//! - Access token providers for Google REST APIs
//! - The [`LinkStore`] abstraction with Firestore and in-memory backends
//! - Shared error types

pub mod auth;
pub mod config;
mod error;
pub mod link;
pub mod store;

// ═══════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════

/// OAuth scope required by the Hosting and Extensions APIs.
pub const FIREBASE_SCOPE: &str = "https://www.googleapis.com/auth/firebase";

/// Timeout applied to every outgoing REST call.
pub const HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

pub use auth::{
    MetadataTokenProvider, StaticTokenProvider, TokenProvider, provider_from_env, provider_from_token,
};
pub use config::ProjectConfig;
pub use error::{Error, Result};
pub use link::{FlowLink, normalize_path};
pub use store::{FirestoreStore, LinkStore, MemoryStore};
