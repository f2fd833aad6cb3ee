//! Project and app identity loaded from environment variables.
//!
//! The variable names match the ones the hosting platform injects into
//! installed extension instances, so the same environment drives both the
//! provisioning run and the redirect server.

/// Project-level configuration shared by every flowlinks binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Cloud project id.
    pub project_id: String,

    /// Extension instance id (used in function and site names).
    pub instance_id: String,

    /// Region of the redirect function / service.
    pub location: String,

    /// iOS bundle identifier (e.g. "com.example.app").
    pub ios_bundle_id: String,

    /// Apple developer team id.
    pub ios_team_id: String,

    /// Numeric App Store id, needed to build store redirects for iOS.
    pub ios_app_store_id: Option<String>,

    /// Android application id (package name).
    pub android_package: String,

    /// SHA-256 signing certificate fingerprints for the Android app.
    pub android_sha256: Vec<String>,

    /// Postfix used when generating hosting site ids.
    pub domain_postfix: String,

    /// Document collection holding link records.
    pub collection: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            instance_id: String::new(),
            location: "us-west1".to_string(),
            ios_bundle_id: String::new(),
            ios_team_id: String::new(),
            ios_app_store_id: None,
            android_package: String::new(),
            android_sha256: Vec::new(),
            domain_postfix: "flowlinks".to_string(),
            collection: "flowlinks".to_string(),
        }
    }
}

impl ProjectConfig {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `PROJECT_ID`, `EXT_INSTANCE_ID`: project and instance ids (default: empty)
    /// - `LOCATION`: region (default: "us-west1")
    /// - `IOS_BUNDLE_ID`, `IOS_TEAM_ID`, `IOS_APP_STORE_ID`: iOS app identity
    /// - `ANDROID_BUNDLE_ID`: Android package name
    /// - `ANDROID_SHA`: comma-separated SHA-256 certificate fingerprints
    /// - `DOMAIN_POSTFIX`: site id postfix (default: "flowlinks")
    /// - `FLOWLINKS_COLLECTION`: link collection (default: "flowlinks")
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let android_sha256 = env_or_default("ANDROID_SHA")
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            project_id: env_or_default("PROJECT_ID"),
            instance_id: env_or_default("EXT_INSTANCE_ID"),
            location: env_non_empty("LOCATION").unwrap_or(defaults.location),
            ios_bundle_id: env_or_default("IOS_BUNDLE_ID"),
            ios_team_id: env_or_default("IOS_TEAM_ID"),
            ios_app_store_id: env_non_empty("IOS_APP_STORE_ID"),
            android_package: env_or_default("ANDROID_BUNDLE_ID"),
            android_sha256,
            domain_postfix: env_non_empty("DOMAIN_POSTFIX").unwrap_or(defaults.domain_postfix),
            collection: env_non_empty("FLOWLINKS_COLLECTION").unwrap_or(defaults.collection),
        }
    }

    /// Apple app id in the form `{team}.{bundle}`.
    pub fn ios_app_id(&self) -> String {
        format!("{}.{}", self.ios_team_id, self.ios_bundle_id)
    }

    /// Name of the redirect function that hosting rewrites target.
    pub fn function_name(&self) -> String {
        format!("ext-{}-api", self.instance_id)
    }

    /// App Store page for the iOS app, when its numeric id is known.
    pub fn app_store_url(&self) -> Option<String> {
        self.ios_app_store_id
            .as_deref()
            .map(|id| format!("https://apps.apple.com/app/id{id}"))
    }

    /// Play Store page for the Android app, when a package is configured.
    pub fn play_store_url(&self) -> Option<String> {
        if self.android_package.is_empty() {
            return None;
        }
        Some(format!(
            "https://play.google.com/store/apps/details?id={}",
            self.android_package
        ))
    }
}

fn env_or_default(key: &str) -> String {
    std::env::var(key).unwrap_or_default().trim().to_string()
}

fn env_non_empty(key: &str) -> Option<String> {
    Some(env_or_default(key)).filter(|v| !v.is_empty())
}
