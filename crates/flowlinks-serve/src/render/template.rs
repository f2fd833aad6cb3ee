//! Page template with `{{placeholder}}` substitution.
//!
//! Templates are plain HTML files. Placeholders are replaced in a single
//! pass, so values that themselves contain `{{...}}` are never expanded
//! again. Unknown placeholders are left untouched.

use std::collections::HashMap;
use std::path::Path;

use maud::html;

/// Built-in link page.
const BUILTIN_TEMPLATE: &str = include_str!("../../assets/link.html");

/// A value substituted into a template.
#[derive(Debug, Clone)]
pub enum Value {
    /// Plain text, HTML-escaped on substitution.
    Text(String),
    /// Markup produced by the renderer, inserted verbatim.
    Markup(String),
}

/// Placeholder name → value.
pub type Values = HashMap<&'static str, Value>;

/// A loaded page template.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
}

impl Template {
    /// Template from an in-memory string.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// The template shipped with the server.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_TEMPLATE)
    }

    /// Load a template from disk.
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "loaded page template");
        Ok(Self::new(source))
    }

    /// Substitute `values` into the template.
    pub fn render(&self, values: &Values) -> String {
        let mut out = String::with_capacity(self.source.len() + 512);
        let mut rest = self.source.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];

            let Some(end) = after_open.find("}}") else {
                // Unterminated placeholder: emit the remainder as-is
                out.push_str(&rest[start..]);
                return out;
            };

            let name = after_open[..end].trim();
            match values.get(name) {
                Some(Value::Text(text)) => out.push_str(&escape(text)),
                Some(Value::Markup(markup)) => out.push_str(markup),
                None => out.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after_open[end + 2..];
        }

        out.push_str(rest);
        out
    }
}

/// HTML-escape text for use in element content and quoted attributes.
fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}
