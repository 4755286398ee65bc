// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline provider for local development.

use async_trait::async_trait;
use glossa_core::{CompletionProvider, CompletionRequest, ProviderFailure, ProviderResponse, TokenUsage};

/// Answers every request with `Dummy translation: <input>` and fixed usage,
/// without touching the network.
#[derive(Debug, Clone, Default)]
pub struct EchoProvider;

impl EchoProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CompletionProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<ProviderResponse, ProviderFailure> {
        let last = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        // The instruction ends with `:\n\n<input>`; echo the text after the first colon.
        let echoed = last.split(':').nth(1).unwrap_or(last).trim();

        Ok(ProviderResponse {
            text: Some(format!("Dummy translation: {echoed}")),
            usage: Some(TokenUsage::new(5, 5)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::{PromptMessage, Role};

    #[tokio::test]
    async fn echoes_instruction_payload() {
        let provider = EchoProvider::new();
        let request = CompletionRequest {
            messages: vec![
                PromptMessage::new(Role::System, "persona"),
                PromptMessage::new(
                    Role::User,
                    "Translate from Vietnamese to Russian, make sure to make no grammar or spelling mistakes:\n\nXin chào",
                ),
            ],
            max_tokens: 256,
        };
        let resp = provider.complete(request).await.unwrap();
        assert_eq!(resp.text.as_deref(), Some("Dummy translation: Xin chào"));
        assert_eq!(resp.usage, Some(TokenUsage::new(5, 5)));
        assert_eq!(resp.usage.unwrap().total_tokens, 10);
    }

    #[tokio::test]
    async fn empty_request_still_answers() {
        let resp = EchoProvider
            .complete(CompletionRequest {
                messages: vec![],
                max_tokens: 1,
            })
            .await
            .unwrap();
        assert_eq!(resp.text.as_deref(), Some("Dummy translation: "));
    }
}
