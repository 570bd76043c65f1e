//! Outcome delivery to the orchestrator.
//!
//! [`HttpResponseSender`] `PUT`s a JSON-encoded [`CallbackResponse`] to the
//! pre-signed URL carried by the request. Delivery is attempted exactly
//! once; there is no retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use nodesweep_core::response::CallbackResponse;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for callback delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("Failed to encode callback body: {0}")]
    Encode(#[from] serde_json::Error),

    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The callback endpoint returned a non-2xx status code.
    #[error("Callback endpoint returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// ResponseSender
// ---------------------------------------------------------------------------

/// Reports a cleanup outcome to the orchestrator.
#[async_trait]
pub trait ResponseSender: Send + Sync {
    /// Deliver `response` to `url`, returning the HTTP status on success.
    async fn send(&self, url: &str, response: &CallbackResponse) -> Result<u16, CallbackError>;
}

// ---------------------------------------------------------------------------
// HttpResponseSender
// ---------------------------------------------------------------------------

/// Sends callbacks over HTTP with [`reqwest`].
#[derive(Debug, Clone)]
pub struct HttpResponseSender {
    client: reqwest::Client,
}

impl HttpResponseSender {
    /// Create a sender whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, CallbackError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Create a sender reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResponseSender for HttpResponseSender {
    async fn send(&self, url: &str, response: &CallbackResponse) -> Result<u16, CallbackError> {
        let body = serde_json::to_vec(response)?;

        // The URL is signed for an empty content type; any other value
        // fails the signature check.
        let reply = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "")
            .body(body)
            .send()
            .await?;

        let status = reply.status().as_u16();
        tracing::info!(
            status,
            outcome = %response.status,
            "Callback response sent",
        );

        if !reply.status().is_success() {
            return Err(CallbackError::HttpStatus(status));
        }
        Ok(status)
    }
}
