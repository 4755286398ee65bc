// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion provider trait for chat-completion backends (OpenAI, Azure OpenAI, etc.).

use async_trait::async_trait;

use crate::error::ProviderFailure;
use crate::types::{CompletionRequest, ProviderResponse};

/// A single-shot chat completion backend.
///
/// Implementations perform exactly one request per call and classify any
/// failure as [`ProviderFailure::Transient`] or [`ProviderFailure::Fatal`].
/// Retrying, queueing, and response validation belong to the caller.
#[async_trait]
pub trait CompletionProvider: Send + Sync + 'static {
    /// Returns the human-readable name of this provider.
    fn name(&self) -> &str;

    /// Sends one completion request.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<ProviderResponse, ProviderFailure>;
}
