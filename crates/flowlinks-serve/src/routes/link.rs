//! Main link route handler.
//!
//! Handles `GET /{*path}`: resolves the path to a stored link and renders
//! its preview page, or a 404 page when there is no live link.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use flowlinks_core::normalize_path;

use super::home::landing_page;
use crate::error::ServeError;
use crate::render::LinkPage;
use crate::render::components::CSP_HEADER;
use crate::resolve::{self, Platform};
use crate::state::AppState;

/// Cache-Control for pages that look the same to every visitor.
const PUBLIC_CACHE: &str = "public, max-age=60, s-maxage=300";

/// Cache-Control for pages whose redirect depends on the User-Agent.
const PRIVATE_CACHE: &str = "private, no-store";

/// Handle a request for a link path.
///
/// 1. Normalizes the path
/// 2. Looks the link up (cached), dropping expired links
/// 3. Picks a redirect target for the visitor's platform
/// 4. Renders the page template and returns it with cache headers
pub async fn link_handler(
    State(state): State<AppState>,
    Path(raw_path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ServeError> {
    let path = normalize_path(&raw_path);

    match resolve_and_render(&state, &path, &headers).await? {
        Some(response) => Ok(response),
        None => Err(ServeError::NotFound(path)),
    }
}

/// Handle `GET /`: the default link (empty path), else the landing page.
pub async fn root_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ServeError> {
    if let Some(response) = resolve_and_render(&state, "", &headers).await? {
        return Ok(response);
    }

    let markup = landing_page(&state.config.site_name).into_string();
    Ok(build_response(&markup, PUBLIC_CACHE))
}

/// Resolve `path` and render its page, or `None` when there is no live link.
async fn resolve_and_render(
    state: &AppState,
    path: &str,
    headers: &HeaderMap,
) -> Result<Option<Response>, ServeError> {
    let Some(link) = resolve::find_link(state, path).await? else {
        return Ok(None);
    };

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok());
    let platform = Platform::from_user_agent(user_agent);
    let redirect = resolve::redirect_target(&link, platform, &state.config.project);

    tracing::debug!(
        path = %path,
        platform = ?platform,
        redirect = redirect.as_deref().unwrap_or(""),
        "resolved link"
    );

    let page = LinkPage {
        link: &link,
        redirect: redirect.as_deref(),
        base_url: &state.config.base_url,
        site_name: &state.config.site_name,
    };
    let html = page.render(&state.template);

    let cache_control = if link.redirect_to_store {
        PRIVATE_CACHE
    } else {
        PUBLIC_CACHE
    };

    Ok(Some(build_response(&html, cache_control)))
}

/// Build an HTTP response with HTML content and security/cache headers.
fn build_response(html: &str, cache_control: &'static str) -> Response {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );

    // Security headers
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CSP_HEADER),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // ETag (xxHash of content)
    let hash = xxhash_rust::xxh3::xxh3_64(html.as_bytes());
    let etag = format!("\"{}\"", hex_fmt::HexFmt(&hash.to_be_bytes()));
    if let Ok(val) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, val);
    }

    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));
    headers.insert(header::VARY, HeaderValue::from_static("User-Agent"));

    (StatusCode::OK, headers, html.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use flowlinks_core::{FlowLink, LinkStore, MemoryStore, ProjectConfig};
    use http_body_util::BodyExt;
    use std::sync::Arc;

    use crate::config::{Config, StoreBackend};
    use crate::render::template::Template;

    const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) Mobile/15E148";

    fn state(links: Vec<FlowLink>) -> AppState {
        let config = Config {
            base_url: "https://links.example.com".to_string(),
            site_name: "Example".to_string(),
            store: StoreBackend::Memory,
            project: ProjectConfig {
                ios_app_store_id: Some("123".to_string()),
                ..ProjectConfig::default()
            },
            ..Config::default()
        };
        AppState::new(
            config,
            Arc::new(MemoryStore::with_links(links)),
            Template::builtin(),
        )
    }

    fn headers(user_agent: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(ua) = user_agent {
            headers.insert(header::USER_AGENT, HeaderValue::from_str(ua).unwrap());
        }
        headers
    }

    async fn get(state: &AppState, path: &str, user_agent: Option<&str>) -> (Response, String) {
        let response = link_handler(
            State(state.clone()),
            Path(path.to_string()),
            headers(user_agent),
        )
        .await
        .into_response();
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        (
            Response::from_parts(parts, axum::body::Body::empty()),
            String::from_utf8(bytes.to_vec()).unwrap(),
        )
    }

    fn promo() -> FlowLink {
        FlowLink {
            title: Some("Summer Sale".to_string()),
            description: Some("Half off".to_string()),
            redirect_url: Some("https://example.com/sale".to_string()),
            ..FlowLink::new("promo")
        }
    }

    #[tokio::test]
    async fn renders_stored_link() {
        let state = state(vec![promo()]);
        let (response, body) = get(&state, "promo/", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], PUBLIC_CACHE);
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
        assert!(response.headers().contains_key(header::ETAG));
        assert!(body.contains("<title>Summer Sale</title>"));
        assert!(body.contains("url=https://example.com/sale"));
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let state = state(vec![promo()]);
        let (response, body) = get(&state, "missing", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body.contains("Link Not Found"));
    }

    #[tokio::test]
    async fn expired_link_is_not_found() {
        let link = FlowLink {
            expires: Some(Utc::now() - Duration::hours(1)),
            ..promo()
        };
        let state = state(vec![link]);
        let (response, _) = get(&state, "promo", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn store_redirect_for_ios_is_private() {
        let link = FlowLink {
            redirect_to_store: true,
            ..promo()
        };
        let state = state(vec![link]);

        let (response, body) = get(&state, "promo", Some(IPHONE_UA)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], PRIVATE_CACHE);
        assert!(body.contains("url=https://apps.apple.com/app/id123"));

        let (_, desktop) = get(&state, "promo", None).await;
        assert!(desktop.contains("url=https://example.com/sale"));
    }

    #[tokio::test]
    async fn cached_lookups_see_new_links_only_after_ttl() {
        let state = state(vec![]);
        let (first, _) = get(&state, "late", None).await;
        assert_eq!(first.status(), StatusCode::NOT_FOUND);

        state.store.put(FlowLink::new("late")).await.unwrap();
        let (cached, _) = get(&state, "late", None).await;
        assert_eq!(cached.status(), StatusCode::NOT_FOUND);

        state.cache.as_ref().unwrap().invalidate_all();
        let (fresh, _) = get(&state, "late", None).await;
        assert_eq!(fresh.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn root_serves_default_link_or_landing_page() {
        let landing = root_handler(State(state(vec![])), headers(None))
            .await
            .into_response();
        assert_eq!(landing.status(), StatusCode::OK);

        let home = FlowLink {
            title: Some("Welcome".to_string()),
            ..FlowLink::new("/")
        };
        let response = root_handler(State(state(vec![home])), headers(None))
            .await
            .into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("<title>Welcome</title>"));
        assert!(body.contains(r#"content="https://links.example.com/""#));
    }

    /// Store whose every call fails like an unavailable backend.
    struct FailingStore;

    #[async_trait::async_trait]
    impl LinkStore for FailingStore {
        async fn find_by_path(&self, _path: &str) -> flowlinks_core::Result<Option<FlowLink>> {
            Err(flowlinks_core::Error::Api {
                status: 503,
                body: "UNAVAILABLE".to_string(),
            })
        }

        async fn put(&self, link: FlowLink) -> flowlinks_core::Result<FlowLink> {
            Ok(link)
        }

        fn backend(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn store_failure_renders_uncached_error_page() {
        let state = AppState::new(
            Config {
                store: StoreBackend::Memory,
                ..Config::default()
            },
            Arc::new(FailingStore),
            Template::builtin(),
        );

        let (response, body) = get(&state, "promo", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        assert!(body.contains("Service Unavailable"));
        assert!(!body.contains("UNAVAILABLE"));

        let root = root_handler(State(state), headers(None)).await.into_response();
        assert_eq!(root.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
