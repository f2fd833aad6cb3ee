//! Client for the Firebase Hosting REST API (`v1beta1`).
//!
//! Covers exactly the calls a one-shot deployment needs:
//!
//! ```text
//! create_site -> create_version -> populate_files -> upload_file*
//!             -> finalize_version -> deploy_version
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use flowlinks_core::TokenProvider;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{InitError, Result, check_response};

/// Default Hosting API endpoint.
pub const HOSTING_BASE_URL: &str = "https://firebasehosting.googleapis.com/v1beta1";

/// Default upload endpoint.
pub const UPLOAD_BASE_URL: &str = "https://upload-firebasehosting.googleapis.com/upload";

// ═══════════════════════════════════════════════════════════════════════════
// Wire types
// ═══════════════════════════════════════════════════════════════════════════

/// Serving configuration attached to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServingConfig {
    /// Handling of `/.well-known/` association files ("NONE" hands them to rewrites).
    pub app_association: String,
    /// Rewrite rules, evaluated in order.
    pub rewrites: Vec<Rewrite>,
}

/// A rewrite from a URL glob to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rewrite {
    /// URL glob the rule applies to.
    pub glob: String,
    /// Backend receiving matching requests.
    #[serde(flatten)]
    pub target: RewriteTarget,
}

/// Where a rewrite sends requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RewriteTarget {
    /// A Cloud Function.
    #[serde(rename_all = "camelCase")]
    Function {
        function: String,
        function_region: String,
    },
    /// A Cloud Run service.
    Run { run: RunTarget },
}

/// Cloud Run service reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTarget {
    pub service_id: String,
    pub region: String,
}

/// Response to a `populateFiles` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulateFilesResponse {
    /// Hashes the server doesn't have yet.
    #[serde(default)]
    pub upload_required_hashes: Vec<String>,
    /// Base URL for uploading those files.
    #[serde(default)]
    pub upload_url: String,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

// ═══════════════════════════════════════════════════════════════════════════
// Client
// ═══════════════════════════════════════════════════════════════════════════

/// Authenticated Hosting API client.
#[derive(Clone)]
pub struct HostingClient {
    client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
    upload_base_url: String,
}

impl HostingClient {
    /// Client against the production endpoints.
    pub fn new(client: reqwest::Client, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            tokens,
            base_url: HOSTING_BASE_URL.to_string(),
            upload_base_url: UPLOAD_BASE_URL.to_string(),
        }
    }

    /// Point the API calls at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Point default uploads at another endpoint.
    pub fn with_upload_base_url(mut self, upload_base_url: impl Into<String>) -> Self {
        self.upload_base_url = upload_base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Upload URL for a version, used when `populateFiles` doesn't return one.
    pub fn default_upload_url(&self, site_id: &str, version_id: &str) -> String {
        format!(
            "{}/sites/{site_id}/versions/{version_id}/files",
            self.upload_base_url
        )
    }

    /// Create a new hosting site in the project.
    pub async fn create_site(&self, project_id: &str, site_id: &str) -> Result<()> {
        let url = format!("{}/projects/{project_id}/sites", self.base_url);
        let request = self
            .client
            .post(url)
            .query(&[("siteId", site_id)])
            .json(&json!({}));

        self.send(request).await?;
        tracing::info!(site_id, "created hosting site");
        Ok(())
    }

    /// Create a version with the given serving config and return its id.
    pub async fn create_version(&self, site_id: &str, config: &ServingConfig) -> Result<String> {
        let url = format!("{}/sites/{site_id}/versions", self.base_url);
        let request = self.client.post(url).json(&json!({ "config": config }));

        let named: Named = self.send(request).await?.json().await?;
        let version_id = named
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| InitError::InvalidResponse(format!("version name {:?}", named.name)))?
            .to_string();

        tracing::info!(site_id, version_id = %version_id, "created version");
        Ok(version_id)
    }

    /// Declare the version's files (path → SHA-256 of the gzipped bytes).
    pub async fn populate_files(
        &self,
        site_id: &str,
        version_id: &str,
        files: &BTreeMap<String, String>,
    ) -> Result<PopulateFilesResponse> {
        let url = format!(
            "{}/sites/{site_id}/versions/{version_id}:populateFiles",
            self.base_url
        );
        let request = self.client.post(url).json(&json!({ "files": files }));

        let response: PopulateFilesResponse = self.send(request).await?.json().await?;
        tracing::info!(
            files = files.len(),
            upload_required = response.upload_required_hashes.len(),
            "populated version files"
        );
        Ok(response)
    }

    /// Upload one gzipped file by hash.
    pub async fn upload_file(&self, upload_url: &str, sha256: &str, gzipped: Vec<u8>) -> Result<()> {
        let url = format!("{}/{sha256}", upload_url.trim_end_matches('/'));
        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(gzipped);

        self.send(request).await?;
        tracing::debug!(sha256, "uploaded file");
        Ok(())
    }

    /// Mark the version as finalized so it can be released.
    pub async fn finalize_version(&self, site_id: &str, version_id: &str) -> Result<()> {
        let url = format!("{}/sites/{site_id}/versions/{version_id}", self.base_url);
        let request = self
            .client
            .patch(url)
            .query(&[("update_mask", "status")])
            .json(&json!({ "status": "FINALIZED" }));

        self.send(request).await?;
        tracing::info!(site_id, version_id, "finalized version");
        Ok(())
    }

    /// Release a finalized version to the live channel.
    pub async fn deploy_version(&self, site_id: &str, version_id: &str) -> Result<()> {
        let url = format!("{}/sites/{site_id}/releases", self.base_url);
        let version_name = format!("sites/{site_id}/versions/{version_id}");
        let request = self
            .client
            .post(url)
            .query(&[("versionName", version_name.as_str())])
            .json(&json!({}));

        self.send(request).await?;
        tracing::info!(site_id, version_id, "released version");
        Ok(())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token.expose_secret()).send().await?;
        check_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlinks_core::StaticTokenProvider;
    use wiremock::matchers::{body_bytes, body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> HostingClient {
        HostingClient::new(
            reqwest::Client::new(),
            Arc::new(StaticTokenProvider::new("ya29.test")),
        )
        .with_base_url(server.uri())
        .with_upload_base_url(format!("{}/upload", server.uri()))
    }

    fn function_config() -> ServingConfig {
        ServingConfig {
            app_association: "NONE".to_string(),
            rewrites: vec![Rewrite {
                glob: "**".to_string(),
                target: RewriteTarget::Function {
                    function: "ext-links-api".to_string(),
                    function_region: "us-west1".to_string(),
                },
            }],
        }
    }

    #[test]
    fn serving_config_wire_format() {
        assert_eq!(
            serde_json::to_value(function_config()).unwrap(),
            json!({
                "appAssociation": "NONE",
                "rewrites": [{"glob": "**", "function": "ext-links-api", "functionRegion": "us-west1"}]
            })
        );

        let run = Rewrite {
            glob: "**".to_string(),
            target: RewriteTarget::Run {
                run: RunTarget {
                    service_id: "flowlinks".to_string(),
                    region: "europe-west1".to_string(),
                },
            },
        };
        assert_eq!(
            serde_json::to_value(run).unwrap(),
            json!({"glob": "**", "run": {"serviceId": "flowlinks", "region": "europe-west1"}})
        );
    }

    #[tokio::test]
    async fn create_site_sends_site_id_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/demo/sites"))
            .and(query_param("siteId", "demo-flowlinks-12345"))
            .and(header("authorization", "Bearer ya29.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo/sites/demo-flowlinks-12345"
            })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .await
            .create_site("demo", "demo-flowlinks-12345")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_version_returns_last_name_segment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sites/site-1/versions"))
            .and(body_json(json!({ "config": function_config() })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "sites/site-1/versions/abc123",
                "status": "CREATED"
            })))
            .mount(&server)
            .await;

        let version = client(&server)
            .await
            .create_version("site-1", &function_config())
            .await
            .unwrap();
        assert_eq!(version, "abc123");
    }

    #[tokio::test]
    async fn create_version_rejects_empty_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sites/site-1/versions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "" })))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .create_version("site-1", &function_config())
            .await
            .unwrap_err();
        assert!(matches!(err, InitError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn populate_files_parses_required_hashes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sites/site-1/versions/v1:populateFiles"))
            .and(body_json(json!({ "files": { "/404.html": "bbb", "/index.html": "aaa" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "uploadRequiredHashes": ["bbb"],
                "uploadUrl": "https://upload.example.com/sites/site-1/versions/v1/files"
            })))
            .mount(&server)
            .await;

        let files = BTreeMap::from([
            ("/index.html".to_string(), "aaa".to_string()),
            ("/404.html".to_string(), "bbb".to_string()),
        ]);
        let response = client(&server)
            .await
            .populate_files("site-1", "v1", &files)
            .await
            .unwrap();
        assert_eq!(response.upload_required_hashes, ["bbb"]);
        assert_eq!(
            response.upload_url,
            "https://upload.example.com/sites/site-1/versions/v1/files"
        );
    }

    #[tokio::test]
    async fn populate_files_tolerates_nothing_to_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sites/site-1/versions/v1:populateFiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let response = client(&server)
            .await
            .populate_files("site-1", "v1", &BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(response, PopulateFilesResponse::default());
    }

    #[tokio::test]
    async fn upload_file_posts_octet_stream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/sites/site-1/versions/v1/files/aaa"))
            .and(header("content-type", "application/octet-stream"))
            .and(body_bytes(vec![0x1f, 0x8b, 0x08]))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let hosting = client(&server).await;
        let upload_url = hosting.default_upload_url("site-1", "v1");
        hosting
            .upload_file(&upload_url, "aaa", vec![0x1f, 0x8b, 0x08])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn finalize_and_deploy() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/sites/site-1/versions/v1"))
            .and(query_param("update_mask", "status"))
            .and(body_json(json!({ "status": "FINALIZED" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/sites/site-1/releases"))
            .and(query_param("versionName", "sites/site-1/versions/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let hosting = client(&server).await;
        hosting.finalize_version("site-1", "v1").await.unwrap();
        hosting.deploy_version("site-1", "v1").await.unwrap();
    }

    #[tokio::test]
    async fn non_success_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/demo/sites"))
            .respond_with(ResponseTemplate::new(409).set_body_string("ALREADY_EXISTS"))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .create_site("demo", "taken")
            .await
            .unwrap_err();
        match err {
            InitError::Api { status, body } => {
                assert_eq!(status, 409);
                assert_eq!(body, "ALREADY_EXISTS");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
