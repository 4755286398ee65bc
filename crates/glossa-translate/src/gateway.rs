// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion gateway: one logical "ask the model" call.
//!
//! Every provider attempt is a separate [`WorkQueue`] task; backoff sleeps
//! happen outside the queue and hold no slot. Transient failures (including
//! a queue timeout) are retried, everything else surfaces as
//! [`GlossaError::Api`].

use std::sync::Arc;

use glossa_core::{
    Completion, CompletionProvider, CompletionRequest, GlossaError, PromptMessage,
    ProviderFailure, ProviderResponse, TokenUsage,
};
use glossa_resilience::{retry_with_backoff, BackoffPolicy, QueueError, RetryError, WorkQueue};
use tracing::{debug, error, warn};

fn queue_failure(err: QueueError<ProviderFailure>) -> ProviderFailure {
    match err {
        QueueError::Task(failure) => failure,
        QueueError::TimedOut(after) => ProviderFailure::Transient {
            status: None,
            message: format!("request timed out in the work queue after {after:?}"),
        },
        QueueError::Closed => ProviderFailure::Fatal {
            status: None,
            message: "work queue is closed".into(),
        },
    }
}

#[derive(Clone)]
pub struct CompletionGateway {
    provider: Arc<dyn CompletionProvider>,
    queue: WorkQueue,
    policy: BackoffPolicy,
}

impl CompletionGateway {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        queue: WorkQueue,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            provider,
            queue,
            policy,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// The shared queue every provider call goes through.
    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    /// Sends `messages` and returns the completion text with its usage.
    pub async fn fetch_completion(
        &self,
        messages: &[PromptMessage],
        max_tokens: u32,
    ) -> Result<Completion, GlossaError> {
        let request = CompletionRequest {
            messages: messages.to_vec(),
            max_tokens,
        };
        let provider_name = self.provider.name();

        let result = retry_with_backoff(
            &self.policy,
            |attempt| {
                let request = request.clone();
                let provider = Arc::clone(&self.provider);
                let queue = self.queue.clone();
                async move {
                    debug!(attempt, provider = provider.name(), "requesting completion");
                    queue
                        .submit(|| provider.complete(request))
                        .await
                        .map_err(queue_failure)
                }
            },
            ProviderFailure::is_transient,
        )
        .await;

        match result {
            Ok(response) => self.accept(response),
            Err(RetryError::Exhausted { attempts, last }) => {
                error!(
                    attempts,
                    provider = provider_name,
                    error = %last,
                    "completion retries exhausted"
                );
                Err(GlossaError::Api {
                    message: format!("completion failed after {attempts} attempts"),
                    source: Some(Box::new(last)),
                })
            }
            Err(RetryError::Aborted { attempt, error }) => {
                error!(
                    attempt,
                    provider = provider_name,
                    error = %error,
                    "completion request refused"
                );
                Err(GlossaError::Api {
                    message: format!("provider refused the request: {error}"),
                    source: Some(Box::new(error)),
                })
            }
        }
    }

    fn accept(&self, response: ProviderResponse) -> Result<Completion, GlossaError> {
        let text = response
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GlossaError::api("provider returned no completion text"))?;

        let usage = response.usage.unwrap_or_else(|| {
            warn!(
                provider = self.provider.name(),
                "provider reported no usage statistics, charging zero tokens"
            );
            TokenUsage::default()
        });

        Ok(Completion { text, usage })
    }
}
