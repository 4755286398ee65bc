// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion provider for deterministic testing.
//!
//! `MockProvider` implements `CompletionProvider` with pre-configured
//! outcomes, so pipeline tests run without network access.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use glossa_core::{
    CompletionProvider, CompletionRequest, ProviderFailure, ProviderResponse, TokenUsage,
};

/// Usage reported for every scripted text response.
pub const MOCK_USAGE: TokenUsage = TokenUsage {
    prompt_tokens: 10,
    completion_tokens: 20,
    total_tokens: 30,
};

/// A mock provider that replays scripted outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty,
/// a default "mock translation" text is returned.
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<Result<ProviderResponse, ProviderFailure>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Create a new mock provider with an empty script.
    pub fn new() -> Self {
        Self::with_script(Vec::new())
    }

    /// Create a mock provider answering with the given texts, in order.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self::with_script(responses.into_iter().map(|t| Ok(text_response(&t))).collect())
    }

    /// Create a mock provider replaying arbitrary outcomes, failures included.
    pub fn with_script(script: Vec<Result<ProviderResponse, ProviderFailure>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Add a text response to the end of the script.
    pub async fn add_response(&self, text: &str) {
        self.script.lock().await.push_back(Ok(text_response(text)));
    }

    /// Add a failure to the end of the script.
    pub async fn add_failure(&self, failure: ProviderFailure) {
        self.script.lock().await.push_back(Err(failure));
    }

    /// Number of `complete` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// A successful response carrying [`MOCK_USAGE`].
pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        text: Some(text.to_string()),
        usage: Some(MOCK_USAGE),
    }
}

/// A rate-limit failure, retried by the gateway.
pub fn rate_limited() -> ProviderFailure {
    ProviderFailure::Transient {
        status: Some(429),
        message: "rate limit exceeded".into(),
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<ProviderResponse, ProviderFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(text_response("mock translation")))
    }
}
