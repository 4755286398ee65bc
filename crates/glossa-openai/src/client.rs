// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Chat Completions API.
//!
//! Provides [`ChatClient`], which builds authenticated requests for either
//! OpenAI or an Azure OpenAI deployment and classifies every failure once,
//! right at the HTTP boundary. It performs exactly one request per call.

use std::time::Duration;

use glossa_core::{GlossaError, ProviderFailure};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::{ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse};

/// Default OpenAI API root.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// HTTP client for one chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ChatClient {
    /// Client for the public OpenAI API (bearer authentication).
    pub fn openai(
        api_key: &str,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, GlossaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            header_value(&format!("Bearer {api_key}"), "API key")?,
        );
        let base = base_url.unwrap_or(OPENAI_BASE_URL).trim_end_matches('/');
        Self::build(headers, format!("{base}/chat/completions"), timeout)
    }

    /// Client for an Azure OpenAI deployment (`api-key` header authentication).
    pub fn azure(
        api_key: &str,
        endpoint: &str,
        deployment: &str,
        api_version: &str,
        timeout: Duration,
    ) -> Result<Self, GlossaError> {
        let mut headers = HeaderMap::new();
        headers.insert("api-key", header_value(api_key, "API key")?);
        let endpoint = endpoint.trim_end_matches('/');
        Self::build(
            headers,
            format!(
                "{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={api_version}"
            ),
            timeout,
        )
    }

    fn build(
        mut headers: HeaderMap,
        endpoint: String,
        timeout: Duration,
    ) -> Result<Self, GlossaError> {
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| GlossaError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one completion request.
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderFailure> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        debug!(status = %status, "completion response received");

        if status.is_success() {
            let body = response.text().await.map_err(classify_transport_error)?;
            return serde_json::from_str::<ChatCompletionResponse>(&body).map_err(|e| {
                ProviderFailure::Fatal {
                    status: Some(status.as_u16()),
                    message: format!("failed to parse API response: {e}"),
                }
            });
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_err) => format!(
                "API error ({}): {}",
                api_err.error.type_.as_deref().unwrap_or("unknown"),
                api_err.error.message
            ),
            Err(_) => format!("API returned {status}: {body}"),
        };

        if is_transient_status(status) {
            Err(ProviderFailure::Transient {
                status: Some(status.as_u16()),
                message,
            })
        } else {
            Err(ProviderFailure::Fatal {
                status: Some(status.as_u16()),
                message,
            })
        }
    }

    #[cfg(test)]
    pub(crate) fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }
}

/// Returns true for HTTP status codes worth retrying.
pub fn is_transient_status(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 404 | 429 | 502 | 503)
}

/// Connection failures and timeouts are transient; anything else is fatal.
fn classify_transport_error(e: reqwest::Error) -> ProviderFailure {
    let message = format!("HTTP request failed: {e}");
    if e.is_timeout() || e.is_connect() {
        ProviderFailure::Transient {
            status: None,
            message,
        }
    } else {
        ProviderFailure::Fatal {
            status: e.status().map(|s| s.as_u16()),
            message,
        }
    }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue, GlossaError> {
    HeaderValue::from_str(value)
        .map_err(|e| GlossaError::Config(format!("invalid {what} header value: {e}")))
}
