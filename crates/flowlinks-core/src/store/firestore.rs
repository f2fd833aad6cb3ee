//! Firestore REST backend.
//!
//! Lookups use `documents:runQuery` with an equality filter on `path`;
//! writes use `PATCH` on the document, which creates or replaces it.
//! The filter matches exactly, so stored `path` values must already be
//! normalized; [`LinkStore::put`] takes care of that for records it writes.
//! Firestore wraps every field in a typed value (`{"stringValue": ...}`),
//! so documents are flattened to plain JSON before being decoded into a
//! [`FlowLink`].

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::LinkStore;
use crate::auth::TokenProvider;
use crate::error::{Error, Result, check_response};
use crate::link::{FlowLink, normalize_path};

/// Default Firestore REST endpoint.
const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Fields written as Firestore timestamps rather than strings.
const TIMESTAMP_FIELDS: &[&str] = &["expires"];

/// A Firestore document as returned by the REST API.
#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// One element of a `runQuery` response stream.
#[derive(Debug, Deserialize)]
struct QueryResult {
    document: Option<Document>,
}

/// Link store backed by a Firestore collection.
pub struct FirestoreStore {
    client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
    project_id: String,
    collection: String,
}

impl FirestoreStore {
    /// Store for `collection` in the project's default database.
    pub fn new(
        client: reqwest::Client,
        tokens: Arc<dyn TokenProvider>,
        project_id: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tokens,
            base_url: FIRESTORE_BASE_URL.to_string(),
            project_id: project_id.into(),
            collection: collection.into(),
        }
    }

    /// Point the store at another endpoint (emulator, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        )
    }
}

#[async_trait]
impl LinkStore for FirestoreStore {
    async fn find_by_path(&self, path: &str) -> Result<Option<FlowLink>> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}:runQuery", self.documents_url());
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "path" },
                        "op": "EQUAL",
                        "value": { "stringValue": path }
                    }
                },
                "limit": 1
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await?;
        let results: Vec<QueryResult> = check_response(response).await?.json().await?;

        match results.into_iter().find_map(|r| r.document) {
            Some(document) => decode_document(document).map(Some),
            None => Ok(None),
        }
    }

    async fn put(&self, link: FlowLink) -> Result<FlowLink> {
        let token = self.tokens.access_token().await?;
        let mut link = link;
        link.path = normalize_path(&link.path);
        let url = format!(
            "{}/{}/{}",
            self.documents_url(),
            self.collection,
            link.document_id()
        );

        let response = self
            .client
            .patch(&url)
            .bearer_auth(token.expose_secret())
            .json(&json!({ "fields": encode_fields(&link)? }))
            .send()
            .await?;
        let document: Document = check_response(response).await?.json().await?;

        tracing::info!(document = %document.name, path = %link.path, "stored link");
        decode_document(document)
    }

    fn backend(&self) -> &'static str {
        "firestore"
    }
}

/// Decode a Firestore document into a link.
fn decode_document(document: Document) -> Result<FlowLink> {
    let mut plain = Map::new();
    for (key, value) in document.fields {
        if let Some(value) = unwrap_value(&value) {
            plain.insert(key, value);
        }
    }

    let mut link: FlowLink =
        serde_json::from_value(Value::Object(plain)).map_err(|e| Error::InvalidDocument {
            name: document.name.clone(),
            reason: e.to_string(),
        })?;

    link.path = normalize_path(&link.path);
    link.id = document.name.rsplit('/').next().map(str::to_string);
    Ok(link)
}

/// Unwrap a typed Firestore value into plain JSON.
///
/// Nulls and value types a link never holds (maps, arrays, references)
/// yield `None` so the field falls back to its default.
fn unwrap_value(value: &Value) -> Option<Value> {
    let (kind, inner) = value.as_object()?.iter().next()?;
    match kind.as_str() {
        "stringValue" | "timestampValue" | "booleanValue" => Some(inner.clone()),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from),
        "doubleValue" => Some(inner.clone()),
        _ => None,
    }
}

/// Encode a link's fields as Firestore typed values.
fn encode_fields(link: &FlowLink) -> Result<Map<String, Value>> {
    let Value::Object(plain) = serde_json::to_value(link)? else {
        return Err(Error::InvalidDocument {
            name: link.document_id(),
            reason: "link did not serialize to an object".to_string(),
        });
    };

    let fields = plain
        .into_iter()
        .filter(|(key, _)| key != "id")
        .map(|(key, value)| {
            let typed = match value {
                Value::Bool(b) => json!({ "booleanValue": b }),
                Value::String(s) if TIMESTAMP_FIELDS.contains(&key.as_str()) => {
                    json!({ "timestampValue": s })
                }
                Value::String(s) => json!({ "stringValue": s }),
                Value::Null => json!({ "nullValue": null }),
                other => json!({ "stringValue": other.to_string() }),
            };
            (key, typed)
        })
        .collect();

    Ok(fields)
}
