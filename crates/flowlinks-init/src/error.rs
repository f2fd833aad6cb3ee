//! Error types for the provisioning run.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, InitError>;

/// Errors that can stop provisioning.
#[derive(Error, Debug)]
pub enum InitError {
    /// A hosting or extensions API call answered with a non-success status.
    #[error("API error (status {status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the server.
        body: String,
    },

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token or link store failure.
    #[error(transparent)]
    Core(#[from] flowlinks_core::Error),

    /// The API answered successfully but with an unexpected body.
    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    /// Missing or inconsistent configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error (asset preparation).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InitError {
    /// HTTP status of a failed API call, wherever it came from.
    pub fn api_status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Core(err) => err.api_status(),
            _ => None,
        }
    }
}

/// Turn a non-success response into [`InitError::Api`], passing success through.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(InitError::Api {
        status: status.as_u16(),
        body,
    })
}
