//! Access tokens for Google REST APIs.
//!
//! Token minting itself belongs to the platform. On managed runtimes the
//! metadata server hands out tokens for the attached service account; for
//! local runs a token can be supplied directly (e.g. from
//! `gcloud auth print-access-token`).
//!
//! ```text
//! TokenProvider (trait)
//!     |
//!     +-- StaticTokenProvider    FLOWLINKS_ACCESS_TOKEN
//!     +-- MetadataTokenProvider  metadata server, cached until near expiry
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{Error, Result, check_response};

/// Default metadata server endpoint.
const METADATA_BASE_URL: &str = "http://metadata.google.internal/computeMetadata/v1";

/// Scopes requested from the metadata server.
const TOKEN_SCOPES: &str = "https://www.googleapis.com/auth/cloud-platform,https://www.googleapis.com/auth/firebase";

/// Refresh this long before the token actually expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Source of OAuth access tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a currently valid access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Token`] or a transport error if no token is available.
    async fn access_token(&self) -> Result<SecretString>;
}

/// A fixed, externally supplied token.
pub struct StaticTokenProvider {
    token: SecretString,
}

impl StaticTokenProvider {
    /// Wrap a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<SecretString> {
        Ok(SecretString::from(self.token.expose_secret().to_string()))
    }
}

/// Token response from the metadata server.
#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: SecretString,
    refresh_at: Instant,
}

/// Tokens for the runtime's default service account.
pub struct MetadataTokenProvider {
    client: reqwest::Client,
    base_url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataTokenProvider {
    /// Provider talking to the standard metadata server.
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, METADATA_BASE_URL)
    }

    /// Provider talking to a custom metadata endpoint (emulators, tests).
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<MetadataToken> {
        let url = format!(
            "{}/instance/service-accounts/default/token",
            self.base_url
        );
        let response = self
            .client
            .get(&url)
            .query(&[("scopes", TOKEN_SCOPES)])
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| Error::Token(format!("metadata server unreachable: {e}")))?;

        let token = check_response(response).await?.json::<MetadataToken>().await?;
        if token.access_token.is_empty() {
            return Err(Error::Token("metadata server returned an empty token".to_string()));
        }
        Ok(token)
    }
}

#[async_trait]
impl TokenProvider for MetadataTokenProvider {
    async fn access_token(&self) -> Result<SecretString> {
        let mut cached = self.cached.lock().await;

        if let Some(entry) = cached.as_ref()
            && Instant::now() < entry.refresh_at
        {
            return Ok(SecretString::from(entry.token.expose_secret().to_string()));
        }

        let fresh = self.fetch().await?;
        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(EXPIRY_MARGIN);
        tracing::debug!(expires_in = fresh.expires_in, "fetched access token");

        let token = SecretString::from(fresh.access_token);
        let result = SecretString::from(token.expose_secret().to_string());
        *cached = Some(CachedToken {
            token,
            refresh_at: Instant::now() + lifetime,
        });

        Ok(result)
    }
}

/// Choose a provider: a static token when one is given, the metadata server otherwise.
pub fn provider_from_token(
    client: reqwest::Client,
    token: Option<String>,
) -> Arc<dyn TokenProvider> {
    match token.filter(|t| !t.trim().is_empty()) {
        Some(token) => {
            tracing::info!("using static access token");
            Arc::new(StaticTokenProvider::new(token.trim()))
        }
        None => {
            tracing::info!("using metadata server access tokens");
            Arc::new(MetadataTokenProvider::new(client))
        }
    }
}

/// [`provider_from_token`] driven by `FLOWLINKS_ACCESS_TOKEN`.
pub fn provider_from_env(client: reqwest::Client) -> Arc<dyn TokenProvider> {
    provider_from_token(client, std::env::var("FLOWLINKS_ACCESS_TOKEN").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn static_provider_returns_token() {
        let provider = StaticTokenProvider::new("ya29.static");
        let token = provider.access_token().await.unwrap();
        assert_eq!(token.expose_secret(), "ya29.static");
    }

    #[tokio::test]
    async fn metadata_provider_caches_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instance/service-accounts/default/token"))
            .and(header("Metadata-Flavor", "Google"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.meta",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = MetadataTokenProvider::with_base_url(reqwest::Client::new(), server.uri());
        let first = provider.access_token().await.unwrap();
        let second = provider.access_token().await.unwrap();
        assert_eq!(first.expose_secret(), "ya29.meta");
        assert_eq!(second.expose_secret(), "ya29.meta");
    }

    #[tokio::test]
    async fn metadata_provider_refetches_short_lived_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instance/service-accounts/default/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.short",
                "expires_in": 30
            })))
            .expect(2)
            .mount(&server)
            .await;

        let provider = MetadataTokenProvider::with_base_url(reqwest::Client::new(), server.uri());
        provider.access_token().await.unwrap();
        provider.access_token().await.unwrap();
    }

    #[tokio::test]
    async fn metadata_provider_surfaces_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no service account"))
            .mount(&server)
            .await;

        let provider = MetadataTokenProvider::with_base_url(reqwest::Client::new(), server.uri());
        let err = provider.access_token().await.unwrap_err();
        assert_eq!(err.api_status(), Some(404));
    }

    #[tokio::test]
    async fn provider_from_token_prefers_static() {
        let provider = provider_from_token(reqwest::Client::new(), Some(" tok ".to_string()));
        assert_eq!(provider.access_token().await.unwrap().expose_secret(), "tok");
    }
}
