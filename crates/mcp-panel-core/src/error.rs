//! Request failures. Every variant is recovered inside [`crate::ApiClient::request`];
//! callers only ever see `None`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    /// Connection refused, DNS failure, timeout, body read error.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx status. `message` is the backend's `message` field, or the generic
    /// `HTTP error! status: <code>` when the body has none.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// A 2xx response whose body is not the expected JSON.
    #[error("Invalid JSON in response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl PanelError {
    /// Builds the `Http` variant from a failed response body.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            message: Option<String>,
        }

        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {}", status));
        PanelError::Http { status, message }
    }
}
