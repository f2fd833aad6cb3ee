//! Reporting the outcome of a provisioning run.
//!
//! Installed extension instances surface a processing state in the console;
//! outside an instance the outcome only goes to the log.

use std::sync::Arc;

use async_trait::async_trait;
use flowlinks_core::TokenProvider;
use secrecy::ExposeSecret;
use serde_json::json;

use crate::error::{InitError, Result, check_response};

/// Default Extensions API endpoint.
pub const EXTENSIONS_BASE_URL: &str = "https://firebaseextensions.googleapis.com/v1beta";

/// Final state of a provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingState {
    /// Everything deployed.
    Complete(String),
    /// A step failed; the message says which way.
    Failed(String),
}

impl ProcessingState {
    /// Successful run.
    pub fn complete() -> Self {
        Self::Complete("Initialization is complete".to_string())
    }

    /// Failed run, with the message derived from the error.
    pub fn failed(error: &InitError) -> Self {
        let message = match error.api_status() {
            Some(status) => format!("Initialization failed. API Error - Status: {status}"),
            None => format!("Initialization failed. {error}"),
        };
        Self::Failed(message)
    }

    /// State name as the Extensions API spells it.
    pub fn state(&self) -> &'static str {
        match self {
            Self::Complete(_) => "PROCESSING_COMPLETE",
            Self::Failed(_) => "PROCESSING_FAILED",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Complete(message) | Self::Failed(message) => message,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Destination for the final processing state.
#[async_trait]
pub trait StateReporter: Send + Sync {
    /// Publish the outcome of the run.
    async fn report(&self, state: &ProcessingState) -> Result<()>;
}

/// Writes the outcome to the log only.
pub struct LogReporter;

#[async_trait]
impl StateReporter for LogReporter {
    async fn report(&self, state: &ProcessingState) -> Result<()> {
        if state.is_failed() {
            tracing::error!(state = state.state(), "{}", state.message());
        } else {
            tracing::info!(state = state.state(), "{}", state.message());
        }
        Ok(())
    }
}

/// Sets the processing state on an installed extension instance.
pub struct ExtensionsRuntime {
    client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
    project_id: String,
    instance_id: String,
}

impl ExtensionsRuntime {
    pub fn new(
        client: reqwest::Client,
        tokens: Arc<dyn TokenProvider>,
        project_id: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tokens,
            base_url: EXTENSIONS_BASE_URL.to_string(),
            project_id: project_id.into(),
            instance_id: instance_id.into(),
        }
    }

    /// Point the runtime API at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl StateReporter for ExtensionsRuntime {
    async fn report(&self, state: &ProcessingState) -> Result<()> {
        let url = format!(
            "{}/projects/{}/instances/{}/runtimeData",
            self.base_url, self.project_id, self.instance_id
        );
        let body = json!({
            "processingState": {
                "state": state.state(),
                "detailMessage": state.message(),
            }
        });

        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .patch(url)
            .query(&[("updateMask", "processingState")])
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await?;
        check_response(response).await?;

        tracing::info!(
            instance = %self.instance_id,
            state = state.state(),
            "reported processing state"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlinks_core::StaticTokenProvider;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn failure_messages() {
        let api = InitError::Api {
            status: 403,
            body: "denied".to_string(),
        };
        assert_eq!(
            ProcessingState::failed(&api).message(),
            "Initialization failed. API Error - Status: 403"
        );

        let other = InitError::Config("PROJECT_ID is not set".to_string());
        let state = ProcessingState::failed(&other);
        assert_eq!(state.state(), "PROCESSING_FAILED");
        assert_eq!(
            state.message(),
            "Initialization failed. configuration error: PROJECT_ID is not set"
        );
    }

    #[test]
    fn complete_state() {
        let state = ProcessingState::complete();
        assert_eq!(state.state(), "PROCESSING_COMPLETE");
        assert_eq!(state.message(), "Initialization is complete");
        assert!(!state.is_failed());
    }

    #[tokio::test]
    async fn extensions_runtime_patches_processing_state() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/projects/demo/instances/links/runtimeData"))
            .and(query_param("updateMask", "processingState"))
            .and(header("authorization", "Bearer ya29.test"))
            .and(body_json(json!({
                "processingState": {
                    "state": "PROCESSING_COMPLETE",
                    "detailMessage": "Initialization is complete"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let runtime = ExtensionsRuntime::new(
            reqwest::Client::new(),
            Arc::new(StaticTokenProvider::new("ya29.test")),
            "demo",
            "links",
        )
        .with_base_url(server.uri());
        runtime.report(&ProcessingState::complete()).await.unwrap();
    }
}
