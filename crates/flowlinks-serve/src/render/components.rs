//! Shared HTML components: error pages and URL/text helpers.
//!
//! Error pages are rendered with maud so they never depend on a custom
//! template being well-formed.

use maud::{DOCTYPE, Markup, PreEscaped, html};

/// Inline CSS for error, 404 and landing pages.
pub const ERROR_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
body{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;display:flex;justify-content:center;align-items:center;min-height:100vh;background:#fafafa;color:#1a1a2e;padding:1rem}
.error-page{text-align:center;max-width:400px}
.error-page h1{font-size:1.5rem;margin-bottom:.75rem}
.error-page p{color:#666;margin-bottom:1rem;line-height:1.5}
.error-page a{color:#4f46e5}
@media(prefers-color-scheme:dark){
body{background:#0f0f17;color:#e0e0e8}
.error-page p{color:#aaa}
.error-page a{color:#a5b4fc}
}
"#;

/// Content-Security-Policy header value.
///
/// Pages are static: inline styles only, no scripts, no frames.
pub const CSP_HEADER: &str = "default-src 'none'; style-src 'unsafe-inline'; img-src https: http: data:; form-action 'none'; frame-ancestors 'none'";

/// Render a minimal centered page with a heading and one paragraph.
pub fn error_page(title: &str, message: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                meta name="robots" content="noindex";
                style { (PreEscaped(ERROR_CSS)) }
            }
            body {
                main class="error-page" {
                    h1 { (title) }
                    p { (message) }
                }
            }
        }
    }
}

/// The page shown for unknown or expired links.
pub fn not_found_page() -> Markup {
    error_page(
        "Link Not Found",
        "This link doesn't exist or has expired. Check the address and try again.",
    )
}

/// Check that a URL is safe to use in `href`/`src` attributes.
///
/// Only HTTP(S) URLs are allowed; this blocks `javascript:` and `data:` URIs.
pub fn is_safe_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Truncate a string to a maximum length, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len;
        while !s.is_char_boundary(end) && end > 0 {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}
