//! The provisioning workflow.
//!
//! A run deploys a fresh hosting site whose every URL is rewritten to the
//! redirect server:
//!
//! 1. Create the site
//! 2. Create a version with the rewrite config
//! 3. Declare the bundled files, upload the ones the server lacks
//! 4. Finalize and release the version
//! 5. Seed the default link record
//!
//! Steps run strictly in order and the first failure ends the run. The
//! outcome is always handed to the [`StateReporter`].

use std::collections::BTreeMap;
use std::sync::Arc;

use flowlinks_core::{FlowLink, LinkStore};
use serde_json::json;

use crate::assets::{StaticAsset, bundled_assets};
use crate::config::InitConfig;
use crate::error::{InitError, Result};
use crate::hosting::{HostingClient, Rewrite, RewriteTarget, RunTarget, ServingConfig};
use crate::runtime::{ProcessingState, StateReporter};

/// Everything a run will do, computed before any API call.
#[derive(Debug, Clone)]
pub struct Plan {
    pub project_id: String,
    pub site_id: String,
    pub serving_config: ServingConfig,
    pub assets: Vec<StaticAsset>,
    /// Record written after the release; `None` when seeding is skipped.
    pub default_link: Option<FlowLink>,
}

impl Plan {
    /// Build the plan for a configuration, resolving the site id.
    pub fn from_config(config: &InitConfig) -> Result<Self> {
        let project = &config.project;
        if project.project_id.is_empty() {
            return Err(InitError::Config("PROJECT_ID is not set".to_string()));
        }

        let target = match &config.run_service {
            Some(service) => RewriteTarget::Run {
                run: RunTarget {
                    service_id: service.clone(),
                    region: project.location.clone(),
                },
            },
            None if project.instance_id.is_empty() => {
                return Err(InitError::Config(
                    "EXT_INSTANCE_ID is not set and no FLOWLINKS_RUN_SERVICE given".to_string(),
                ));
            }
            None => RewriteTarget::Function {
                function: project.function_name(),
                function_region: project.location.clone(),
            },
        };

        Ok(Self {
            project_id: project.project_id.clone(),
            site_id: config.resolve_site_id(),
            serving_config: ServingConfig {
                app_association: "NONE".to_string(),
                rewrites: vec![Rewrite {
                    glob: "**".to_string(),
                    target,
                }],
            },
            assets: bundled_assets()?,
            default_link: (!config.skip_seed).then(default_link),
        })
    }

    /// Site path → SHA-256 for every bundled file.
    pub fn file_hashes(&self) -> BTreeMap<String, String> {
        self.assets
            .iter()
            .map(|asset| (asset.path.clone(), asset.sha256.clone()))
            .collect()
    }

    /// JSON description of the plan, for `--dry-run`.
    pub fn summary(&self) -> serde_json::Value {
        json!({
            "project": self.project_id,
            "site": self.site_id,
            "config": self.serving_config,
            "files": self.file_hashes(),
            "defaultLink": self.default_link,
        })
    }
}

/// The record served at the site root until the project adds its own.
pub fn default_link() -> FlowLink {
    FlowLink {
        title: Some("My Amazing Application".to_string()),
        description: Some("Find out more about the app...".to_string()),
        ..FlowLink::new("")
    }
}

/// Identifiers of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub site_id: String,
    pub version_id: String,
    /// Number of files actually uploaded.
    pub uploaded: usize,
}

/// Executes a [`Plan`] against the Hosting API.
pub struct Provisioner {
    hosting: HostingClient,
    store: Option<Arc<dyn LinkStore>>,
    reporter: Arc<dyn StateReporter>,
}

impl Provisioner {
    pub fn new(hosting: HostingClient, reporter: Arc<dyn StateReporter>) -> Self {
        Self {
            hosting,
            store: None,
            reporter,
        }
    }

    /// Store receiving the default link record.
    pub fn with_store(mut self, store: Arc<dyn LinkStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Run the plan and report the outcome.
    ///
    /// A failure to report is logged but doesn't change the returned state.
    pub async fn run(&self, plan: &Plan) -> ProcessingState {
        let state = match self.deploy(plan).await {
            Ok(deployment) => {
                tracing::info!(
                    site_id = %deployment.site_id,
                    version_id = %deployment.version_id,
                    uploaded = deployment.uploaded,
                    "provisioning complete"
                );
                ProcessingState::complete()
            }
            Err(e) => {
                tracing::error!(error = %e, site_id = %plan.site_id, "provisioning failed");
                ProcessingState::failed(&e)
            }
        };

        if let Err(e) = self.reporter.report(&state).await {
            tracing::warn!(error = %e, "failed to report processing state");
        }

        state
    }

    /// Run every step, stopping at the first error.
    pub async fn deploy(&self, plan: &Plan) -> Result<Deployment> {
        let site_id = plan.site_id.as_str();

        self.hosting.create_site(&plan.project_id, site_id).await?;
        let version_id = self
            .hosting
            .create_version(site_id, &plan.serving_config)
            .await?;

        let populated = self
            .hosting
            .populate_files(site_id, &version_id, &plan.file_hashes())
            .await?;
        let upload_url = if populated.upload_url.is_empty() {
            self.hosting.default_upload_url(site_id, &version_id)
        } else {
            populated.upload_url.clone()
        };

        let mut uploaded = 0;
        for asset in &plan.assets {
            if !populated.upload_required_hashes.contains(&asset.sha256) {
                tracing::debug!(path = %asset.path, "file already present, skipping upload");
                continue;
            }
            self.hosting
                .upload_file(&upload_url, &asset.sha256, asset.gzipped.clone())
                .await?;
            uploaded += 1;
        }

        self.hosting.finalize_version(site_id, &version_id).await?;
        self.hosting.deploy_version(site_id, &version_id).await?;

        if let Some(link) = &plan.default_link {
            match &self.store {
                Some(store) => {
                    let stored = store.put(link.clone()).await?;
                    tracing::info!(id = ?stored.id, backend = store.backend(), "seeded default link");
                }
                None => tracing::warn!("no link store configured, default link not seeded"),
            }
        }

        Ok(Deployment {
            site_id: site_id.to_string(),
            version_id,
            uploaded,
        })
    }
}
