//! Landing page shown at `/` when no default link is stored.

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::render::components::ERROR_CSS;

/// Render the landing page.
pub fn landing_page(site_name: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (site_name) }
                meta property="og:title" content=(site_name);
                meta property="og:type" content="website";
                style { (PreEscaped(ERROR_CSS)) }
            }
            body {
                main class="error-page" {
                    h1 { (site_name) }
                    p { "Open a shared link to continue to the app." }
                }
            }
        }
    }
}
