//! The stored link record.
//!
//! Field names on the wire match the documents written by the link editor:
//! Open Graph fields keep their `og:` prefix, flags are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A deep link: social preview metadata plus redirect behavior for one path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowLink {
    /// Document id in the store. Not part of the document body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Short path without surrounding slashes. Empty for the default record.
    #[serde(default)]
    pub path: String,

    /// Preview title.
    #[serde(rename = "og:title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Preview description.
    #[serde(
        rename = "og:description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,

    /// Preview image URL.
    #[serde(rename = "og:image", default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Send mobile visitors to the platform's app store.
    #[serde(rename = "redirectToStore", default)]
    pub redirect_to_store: bool,

    /// Fallback redirect target.
    #[serde(
        rename = "redirectUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub redirect_url: Option<String>,

    /// After this instant the link resolves as not found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl FlowLink {
    /// Create a link for `path` with no metadata.
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_path(path),
            ..Self::default()
        }
    }

    /// Whether the link has expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    /// Document id used when writing this link.
    ///
    /// Slashes are not allowed inside a document id, so nested paths are
    /// flattened with `~`.
    pub fn document_id(&self) -> String {
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            return id.to_string();
        }
        if self.path.is_empty() {
            "default".to_string()
        } else {
            self.path.replace('/', "~")
        }
    }
}

/// Normalize a request or stored path: trim whitespace and surrounding slashes.
pub fn normalize_path(raw: &str) -> String {
    raw.trim().trim_matches('/').to_string()
}
