//! Configuration for the provisioning run.

use flowlinks_core::ProjectConfig;
use rand::Rng;

/// Range of the random number appended to generated site ids.
const SITE_NUMBER_RANGE: std::ops::RangeInclusive<u32> = 10_000..=40_000;

/// Provisioning configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitConfig {
    /// Project and app identity.
    pub project: ProjectConfig,

    /// Fixed hosting site id; generated when `None`.
    pub site_id: Option<String>,

    /// Cloud Run service to rewrite to instead of the instance's function.
    pub run_service: Option<String>,

    /// Skip writing the default link record.
    pub skip_seed: bool,
}

impl InitConfig {
    /// Load configuration from environment variables.
    ///
    /// Besides the [`ProjectConfig`] variables:
    /// - `FLOWLINKS_SITE_ID`: use this site id instead of generating one
    /// - `FLOWLINKS_RUN_SERVICE`: rewrite to this Cloud Run service (in `LOCATION`)
    /// - `FLOWLINKS_SKIP_SEED`: "1"/"true" to leave the link store untouched
    pub fn from_env() -> Self {
        Self {
            project: ProjectConfig::from_env(),
            site_id: env_non_empty("FLOWLINKS_SITE_ID"),
            run_service: env_non_empty("FLOWLINKS_RUN_SERVICE"),
            skip_seed: env_non_empty("FLOWLINKS_SKIP_SEED")
                .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
        }
    }

    /// The configured site id, or a fresh `{project}-{postfix}-{n}`.
    pub fn resolve_site_id(&self) -> String {
        match &self.site_id {
            Some(id) => id.clone(),
            None => generate_site_id(
                &self.project.project_id,
                &self.project.domain_postfix,
                &mut rand::thread_rng(),
            ),
        }
    }
}

/// Build a site id with a random numeric suffix.
pub fn generate_site_id(project_id: &str, postfix: &str, rng: &mut impl Rng) -> String {
    let n = rng.gen_range(SITE_NUMBER_RANGE);
    format!("{project_id}-{postfix}-{n}")
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Mutex;

    /// Mutex to serialize config tests that manipulate env vars.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "PROJECT_ID",
        "FLOWLINKS_SITE_ID",
        "FLOWLINKS_RUN_SERVICE",
        "FLOWLINKS_SKIP_SEED",
    ];

    fn with_env_vars<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let _guard = ENV_MUTEX.lock().unwrap();

        // SAFETY: env mutation is serialized by ENV_MUTEX
        unsafe {
            for key in ENV_KEYS {
                std::env::remove_var(key);
            }
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
        }

        f();

        unsafe {
            for key in ENV_KEYS {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn defaults_from_empty_env() {
        with_env_vars(&[], || {
            let config = InitConfig::from_env();
            assert_eq!(config.site_id, None);
            assert_eq!(config.run_service, None);
            assert!(!config.skip_seed);
        });
    }

    #[test]
    fn reads_overrides() {
        with_env_vars(
            &[
                ("PROJECT_ID", "demo"),
                ("FLOWLINKS_SITE_ID", " demo-links "),
                ("FLOWLINKS_RUN_SERVICE", "flowlinks-serve"),
                ("FLOWLINKS_SKIP_SEED", "TRUE"),
            ],
            || {
                let config = InitConfig::from_env();
                assert_eq!(config.project.project_id, "demo");
                assert_eq!(config.site_id.as_deref(), Some("demo-links"));
                assert_eq!(config.run_service.as_deref(), Some("flowlinks-serve"));
                assert!(config.skip_seed);
                assert_eq!(config.resolve_site_id(), "demo-links");
            },
        );
    }

    #[test]
    fn skip_seed_requires_truthy_value() {
        with_env_vars(&[("FLOWLINKS_SKIP_SEED", "no")], || {
            assert!(!InitConfig::from_env().skip_seed);
        });
    }

    #[test]
    fn generated_site_ids_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let id = generate_site_id("demo", "flowlinks", &mut rng);
            let n: u32 = id
                .strip_prefix("demo-flowlinks-")
                .and_then(|n| n.parse().ok())
                .unwrap();
            assert!(SITE_NUMBER_RANGE.contains(&n), "{id}");
        }
    }
}
