//! Error types shared by the flowlinks crates.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the link store and token providers.
#[derive(Error, Debug)]
pub enum Error {
    /// A REST API answered with a non-success status.
    #[error("API error (status {status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the server.
        body: String,
    },

    /// Transport-level HTTP failure (connect, timeout, decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A stored document could not be mapped to a link record.
    #[error("invalid document '{name}': {reason}")]
    InvalidDocument {
        /// Document name or id.
        name: String,
        /// Description of what's wrong.
        reason: String,
    },

    /// No access token could be obtained.
    #[error("token error: {0}")]
    Token(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status of an API error, if this is one.
    pub fn api_status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Turn a non-success response into [`Error::Api`], passing success through.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_api() {
        let err = Error::Api {
            status: 403,
            body: "forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "API error (status 403): forbidden");
        assert_eq!(err.api_status(), Some(403));
    }

    #[test]
    fn error_display_invalid_document() {
        let err = Error::InvalidDocument {
            name: "links/abc".to_string(),
            reason: "missing path".to_string(),
        };
        assert_eq!(err.to_string(), "invalid document 'links/abc': missing path");
        assert_eq!(err.api_status(), None);
    }

    #[test]
    fn error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
