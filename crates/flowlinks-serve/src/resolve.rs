//! Link resolution: path lookup, expiry, and redirect target selection.

use chrono::{DateTime, Utc};
use flowlinks_core::{FlowLink, ProjectConfig};

use crate::error::ServeError;
use crate::render::components::is_safe_url;
use crate::state::AppState;

/// Visitor platform, as far as the User-Agent tells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// iPhone, iPad or iPod.
    Ios,
    /// Android phone or tablet.
    Android,
    /// Desktop browsers, crawlers, anything else.
    Other,
}

impl Platform {
    /// Detect the platform from a User-Agent header value.
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent else {
            return Self::Other;
        };

        if ["iPhone", "iPad", "iPod"].iter().any(|d| ua.contains(d)) {
            Self::Ios
        } else if ua.contains("Android") {
            Self::Android
        } else {
            Self::Other
        }
    }
}

/// Look up the live link for a normalized path.
///
/// Lookups go through the cache when it is enabled. Expiry is checked on
/// every request, so a cached link stops resolving as soon as it expires.
pub async fn find_link(state: &AppState, path: &str) -> Result<Option<FlowLink>, ServeError> {
    let link = match &state.cache {
        Some(cache) => match cache.get(path).await {
            Some(cached) => {
                tracing::debug!(path = %path, "cache hit");
                cached
            }
            None => {
                tracing::debug!(path = %path, "cache miss, querying store");
                let fetched = state.store.find_by_path(path).await?;
                cache.insert(path.to_string(), fetched.clone()).await;
                fetched
            }
        },
        None => state.store.find_by_path(path).await?,
    };

    Ok(live(link, Utc::now()))
}

/// Drop a link that has expired as of `now`.
fn live(link: Option<FlowLink>, now: DateTime<Utc>) -> Option<FlowLink> {
    match link {
        Some(link) if link.is_expired(now) => {
            tracing::debug!(path = %link.path, expires = ?link.expires, "link expired");
            None
        }
        other => other,
    }
}

/// Choose where the page should send the visitor, if anywhere.
///
/// Store redirects win for mobile visitors when the link asks for them and
/// the store listing is known; everyone else gets the link's own redirect
/// URL, provided it is http(s).
pub fn redirect_target(
    link: &FlowLink,
    platform: Platform,
    project: &ProjectConfig,
) -> Option<String> {
    if link.redirect_to_store {
        let store_url = match platform {
            Platform::Ios => project.app_store_url(),
            Platform::Android => project.play_store_url(),
            Platform::Other => None,
        };
        if store_url.is_some() {
            return store_url;
        }
    }

    link.redirect_url
        .as_deref()
        .map(str::trim)
        .filter(|url| is_safe_url(url))
        .map(str::to_string)
}
