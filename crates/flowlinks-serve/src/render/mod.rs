//! HTML rendering for resolved links.
//!
//! Link pages go through the configurable [`Template`]; the conditional
//! parts (image tags, refresh, call-to-action) are rendered with
//! [maud](https://maud.lambda.xyz/) and inserted as markup placeholders,
//! so custom templates stay free of any logic.
//!
//! | placeholder | kind | content |
//! |---|---|---|
//! | `{{title}}` | text | link title, or the site name |
//! | `{{subtitle}}` | text | link description |
//! | `{{image}}` | text | preview image URL (may be empty) |
//! | `{{url}}` | text | canonical URL of the link |
//! | `{{redirect}}` | text | redirect target (may be empty) |
//! | `{{site_name}}` | text | configured site name |
//! | `{{meta}}` | markup | image, twitter card and refresh `<meta>` tags |
//! | `{{hero}}` | markup | preview image element |
//! | `{{actions}}` | markup | "Continue" button when redirecting |

pub mod components;
pub mod template;

use flowlinks_core::FlowLink;
use maud::{Markup, html};

use self::components::{is_safe_url, truncate};
use self::template::{Template, Value, Values};

/// Longest description placed in meta tags.
const MAX_DESCRIPTION_LEN: usize = 300;

/// Everything needed to render one link page.
pub struct LinkPage<'a> {
    /// The resolved link.
    pub link: &'a FlowLink,
    /// Where the page sends the visitor, if anywhere.
    pub redirect: Option<&'a str>,
    /// Base URL of the link domain, without trailing slash.
    pub base_url: &'a str,
    /// Configured site name.
    pub site_name: &'a str,
}

impl LinkPage<'_> {
    /// Canonical URL of the link.
    pub fn canonical_url(&self) -> String {
        if self.link.path.is_empty() {
            format!("{}/", self.base_url)
        } else {
            format!("{}/{}", self.base_url, self.link.path)
        }
    }

    fn title(&self) -> &str {
        self.link
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(self.site_name)
    }

    fn description(&self) -> String {
        self.link
            .description
            .as_deref()
            .map(|d| truncate(d.trim(), MAX_DESCRIPTION_LEN))
            .unwrap_or_default()
    }

    fn image(&self) -> Option<&str> {
        self.link
            .image
            .as_deref()
            .map(str::trim)
            .filter(|u| is_safe_url(u))
    }

    /// Substitution values for the template.
    pub fn values(&self) -> Values {
        let title = self.title().to_string();
        let image = self.image();

        let mut values = Values::new();
        values.insert("title", Value::Text(title.clone()));
        values.insert("subtitle", Value::Text(self.description()));
        values.insert("image", Value::Text(image.unwrap_or_default().to_string()));
        values.insert("url", Value::Text(self.canonical_url()));
        values.insert(
            "redirect",
            Value::Text(self.redirect.unwrap_or_default().to_string()),
        );
        values.insert("site_name", Value::Text(self.site_name.to_string()));
        values.insert("meta", Value::Markup(meta_tags(image, self.redirect).into_string()));
        values.insert("hero", Value::Markup(hero(image, &title).into_string()));
        values.insert("actions", Value::Markup(actions(self.redirect).into_string()));
        values
    }

    /// Render the page through `template`.
    pub fn render(&self, template: &Template) -> String {
        template.render(&self.values())
    }
}

/// Conditional `<head>` tags.
fn meta_tags(image: Option<&str>, redirect: Option<&str>) -> Markup {
    html! {
        @if let Some(image) = image {
            meta property="og:image" content=(image);
            meta name="twitter:image" content=(image);
            meta name="twitter:card" content="summary_large_image";
        } @else {
            meta name="twitter:card" content="summary";
        }
        @if let Some(url) = redirect {
            meta http-equiv="refresh" content=(format!("0; url={url}"));
        }
    }
}

fn hero(image: Option<&str>, title: &str) -> Markup {
    html! {
        @if let Some(image) = image {
            img class="link-image" src=(image) alt=(title);
        }
    }
}

fn actions(redirect: Option<&str>) -> Markup {
    html! {
        @if let Some(url) = redirect {
            a class="link-button" href=(url) rel="noopener" { "Continue" }
        }
    }
}
