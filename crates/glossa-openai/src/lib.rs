// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-completion providers for the Glossa translation service.
//!
//! [`OpenAiProvider`] implements [`CompletionProvider`] for both the public
//! OpenAI API and Azure OpenAI deployments. [`EchoProvider`] is an offline
//! stand-in. Use [`build_provider`] to pick one from configuration.

pub mod client;
pub mod echo;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use glossa_config::model::{ProviderConfig, ProviderKind};
use glossa_core::{
    CompletionProvider, CompletionRequest, GlossaError, ProviderFailure, ProviderResponse,
    TokenUsage,
};
use tracing::info;

use crate::client::ChatClient;
use crate::types::{ChatCompletionRequest, ChatMessage};

pub use echo::EchoProvider;

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingSettings {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl From<&ProviderConfig> for SamplingSettings {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            frequency_penalty: config.frequency_penalty,
            presence_penalty: config.presence_penalty,
        }
    }
}

/// OpenAI / Azure OpenAI provider implementing [`CompletionProvider`].
///
/// API key resolution order: config -> `OPENAI_API_KEY` (or
/// `AZURE_OPENAI_KEY` for Azure) -> error.
pub struct OpenAiProvider {
    client: ChatClient,
    sampling: SamplingSettings,
    name: &'static str,
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, GlossaError> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let (client, name) = match config.kind {
            ProviderKind::Azure => {
                let api_key = resolve_api_key(&config.api_key, "AZURE_OPENAI_KEY")?;
                let endpoint = config.base_url.as_deref().ok_or_else(|| {
                    GlossaError::Config("provider.base_url is required for Azure".into())
                })?;
                let deployment = config.azure_deployment.as_deref().ok_or_else(|| {
                    GlossaError::Config("provider.azure_deployment is required for Azure".into())
                })?;
                let client = ChatClient::azure(
                    &api_key,
                    endpoint,
                    deployment,
                    &config.azure_api_version,
                    timeout,
                )?;
                (client, "azure-openai")
            }
            _ => {
                let api_key = resolve_api_key(&config.api_key, "OPENAI_API_KEY")?;
                let client = ChatClient::openai(&api_key, config.base_url.as_deref(), timeout)?;
                (client, "openai")
            }
        };

        info!(
            provider = name,
            model = config.model,
            endpoint = client.endpoint(),
            "completion provider initialized"
        );

        Ok(Self {
            client,
            sampling: SamplingSettings::from(config),
            name,
        })
    }

    /// Creates a provider with an existing client (for testing).
    #[cfg(test)]
    fn with_client(client: ChatClient, sampling: SamplingSettings) -> Self {
        Self {
            client,
            sampling,
            name: "openai",
        }
    }

    fn to_chat_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.sampling.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: self.sampling.temperature,
            top_p: self.sampling.top_p,
            frequency_penalty: self.sampling.frequency_penalty,
            presence_penalty: self.sampling.presence_penalty,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<ProviderResponse, ProviderFailure> {
        let response = self
            .client
            .chat_completion(&self.to_chat_request(&request))
            .await?;

        Ok(ProviderResponse {
            text: response.first_text().map(str::to_string),
            usage: response
                .usage
                .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
        })
    }
}

/// Builds the provider selected by `provider.kind`.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn CompletionProvider>, GlossaError> {
    match config.kind {
        ProviderKind::Echo => {
            info!("using offline echo provider");
            Ok(Arc::new(EchoProvider::new()))
        }
        ProviderKind::OpenAi | ProviderKind::Azure => Ok(Arc::new(OpenAiProvider::new(config)?)),
    }
}

/// Returns the configured key, falling back to the given environment variable.
fn resolve_api_key(config_key: &Option<String>, env_var: &str) -> Result<String, GlossaError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var(env_var)
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            GlossaError::Config(format!(
                "API key not found. Set provider.api_key in config or the {env_var} environment variable."
            ))
        })
}
