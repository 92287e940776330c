//! Shared HTTP client for the Gemini backend and the OAuth token exchange
//!
//! Only a connect timeout is configured. A streaming generation can run for
//! minutes and is bounded by the caller's cancellation, not by a request
//! timeout. Retries are owned by the engine's retry controller, so this
//! client makes exactly one attempt per call.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use rolerun_redaction::redact_error_message;
use rolerun_utils::error::LlmError;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest provider error body carried into an error message
const MAX_ERROR_DETAIL_CHARS: usize = 512;

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns the builder's error text if the client cannot be constructed.
    pub fn new() -> Result<Self, String> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self { client })
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Send a request once and map non-success statuses to [`LlmError`].
    ///
    /// On an error status the response body is read so the provider's own
    /// message can be included.
    pub async fn send(
        &self,
        request: RequestBuilder,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let response = request.send().await.map_err(|e| {
            LlmError::Transport(format!(
                "{} request failed: {}",
                provider_name,
                redact_error_message(&e.to_string())
            ))
        })?;

        let status = response.status();
        debug!(provider = provider_name, status = status.as_u16(), "Received response headers");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_status_error(status, provider_name, &error_detail(&body)))
    }
}

/// Map an HTTP error status to an [`LlmError`] variant.
///
/// - 401/403 → `ProviderAuth`
/// - 429 → `ProviderQuota`
/// - 5xx → `ProviderOutage`
/// - anything else → `Transport`
pub(crate) fn map_status_error(status: StatusCode, provider_name: &str, detail: &str) -> LlmError {
    let suffix = if detail.is_empty() {
        String::new()
    } else {
        format!(" ({detail})")
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::ProviderAuth(format!(
            "{provider_name} authentication failed: {status}{suffix}"
        )),
        StatusCode::TOO_MANY_REQUESTS => LlmError::ProviderQuota(format!(
            "{provider_name} rate limit exceeded: {status}{suffix}"
        )),
        s if s.is_server_error() => LlmError::ProviderOutage(format!(
            "{provider_name} returned server error: {status}{suffix}"
        )),
        _ => LlmError::Transport(format!(
            "{provider_name} returned client error: {status}{suffix}"
        )),
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Extract a short, redacted description from an error response body.
///
/// Google APIs wrap errors as `{"error": {"message": ...}}`, sometimes inside
/// a one-element array on streaming endpoints.
pub(crate) fn error_detail(body: &str) -> String {
    let trimmed = body.trim();
    let message = serde_json::from_str::<ErrorEnvelope>(trimmed)
        .map(|e| e.error.message)
        .or_else(|_| {
            serde_json::from_str::<Vec<ErrorEnvelope>>(trimmed).map(|mut v| {
                v.pop().map(|e| e.error.message).unwrap_or_default()
            })
        })
        .unwrap_or_else(|_| trimmed.to_string());

    let redacted = redact_error_message(&message);
    if redacted.chars().count() > MAX_ERROR_DETAIL_CHARS {
        let cut: String = redacted.chars().take(MAX_ERROR_DETAIL_CHARS).collect();
        format!("{cut}...")
    } else {
        redacted
    }
}
