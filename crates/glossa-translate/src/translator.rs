// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translation orchestrator.
//!
//! Validates and normalizes the block, composes the prompt once, then asks
//! the gateway for a completion until the output passes the sanity checks or
//! the re-translation budget is spent. Attempts are strictly sequential.

use std::sync::Arc;

use glossa_config::model::TranslationConfig;
use glossa_config::GlossaConfig;
use glossa_core::{
    Block, CompletionProvider, ConversationMessage, ExampleRetriever, GlossaError,
    PromptMessage, Role, TokenUsage, TranslateOptions, TranslationBlock, TranslationOutcome,
};
use glossa_resilience::{BackoffPolicy, QueueStats, WorkQueue};
use tracing::{debug, info, warn};

use crate::gateway::CompletionGateway;
use crate::normalize::{max_output_tokens, normalize_input};
use crate::prompt::PromptComposer;
use crate::sanity::{OutputSanityChecker, Suspicion};

/// One completion and the checker's verdict on it.
struct AttemptResult {
    text: String,
    usage: TokenUsage,
    suspicion: Option<Suspicion>,
}

#[derive(Clone)]
pub struct Translator {
    composer: PromptComposer,
    gateway: CompletionGateway,
    checker: OutputSanityChecker,
    limits: TranslationConfig,
}

impl Translator {
    pub fn new(
        composer: PromptComposer,
        gateway: CompletionGateway,
        checker: OutputSanityChecker,
        limits: TranslationConfig,
    ) -> Self {
        Self {
            composer,
            gateway,
            checker,
            limits,
        }
    }

    /// Wires a translator from configuration around the process-wide `queue`.
    pub fn from_config(
        config: &GlossaConfig,
        provider: Arc<dyn CompletionProvider>,
        queue: WorkQueue,
        retriever: Option<Arc<dyn ExampleRetriever>>,
    ) -> Self {
        let mut composer = PromptComposer::new(&config.prompt);
        if let Some(retriever) = retriever {
            composer = composer.with_retriever(retriever);
        }
        let gateway = CompletionGateway::new(provider, queue, BackoffPolicy::from(&config.retry));
        Self::new(
            composer,
            gateway,
            OutputSanityChecker::new(&config.sanity),
            config.translation.clone(),
        )
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.gateway.queue().stats()
    }

    pub fn provider_name(&self) -> &str {
        self.gateway.provider_name()
    }

    /// Translates `block` given the document's stored `history`.
    ///
    /// Returns the translated block and the records to append to the history.
    /// Fails only with [`GlossaError::Validation`] or [`GlossaError::Api`].
    pub async fn translate(
        &self,
        block: &Block,
        history: &[ConversationMessage],
        options: &TranslateOptions,
    ) -> Result<TranslationOutcome, GlossaError> {
        let input_chars = block.text.chars().count();
        if input_chars > self.limits.max_input_chars {
            warn!(
                block_id = %block.id,
                chars = input_chars,
                limit = self.limits.max_input_chars,
                "rejecting oversized block"
            );
            return Err(GlossaError::Validation(
                "text too long for translation".into(),
            ));
        }

        let source = Block {
            id: block.id.clone(),
            text: normalize_input(&block.text),
        };
        if source.text.is_empty() {
            return Err(GlossaError::Validation(
                "block has no text to translate".into(),
            ));
        }

        let max_tokens = max_output_tokens(source.text.chars().count(), &self.limits);
        let prompt = self.composer.compose(&source, history, options).await?;

        let max_attempts = self.checker.max_retranslations().saturating_add(1);
        let mut total = TokenUsage::default();
        let mut last: Option<AttemptResult> = None;
        for attempt in 1..=max_attempts {
            let result = self
                .attempt(&prompt.messages, max_tokens, &source.text)
                .await?;
            total += result.usage;
            let done = match &result.suspicion {
                None => {
                    debug!(block_id = %source.id, attempt, "translation accepted");
                    true
                }
                Some(reason) => {
                    warn!(
                        block_id = %source.id,
                        attempt,
                        max_attempts,
                        reason = %reason,
                        "suspicious translation"
                    );
                    false
                }
            };
            last = Some(result);
            if done {
                break;
            }
        }
        let Some(last) = last else {
            return Err(GlossaError::api("no translation attempt was made"));
        };

        let accepted = last.suspicion.is_none();
        let text = if accepted {
            last.text
        } else {
            warn!(
                block_id = %source.id,
                attempts = max_attempts,
                "translation stayed suspicious, flagging for review"
            );
            self.checker.repair(&last.text)
        };

        let mut new_messages = prompt.new_records;
        if let Some(user) = new_messages.last_mut() {
            user.tokens = Some(total.prompt_tokens);
            user.attach_to_prompt = accepted;
        }
        let mut reply = ConversationMessage::new(Role::Assistant, text.clone())
            .for_block(&source.id)
            .attached(accepted);
        reply.tokens = Some(total.completion_tokens);
        new_messages.push(reply);

        info!(
            block_id = %source.id,
            accepted,
            prompt_tokens = total.prompt_tokens,
            completion_tokens = total.completion_tokens,
            "block translated"
        );

        Ok(TranslationOutcome {
            translated_block: TranslationBlock {
                id: block.id.clone(),
                text,
                edited_manually: None,
            },
            new_messages,
            usage: total,
        })
    }

    async fn attempt(
        &self,
        messages: &[PromptMessage],
        max_tokens: u32,
        original: &str,
    ) -> Result<AttemptResult, GlossaError> {
        let completion = self.gateway.fetch_completion(messages, max_tokens).await?;
        let suspicion = self.checker.inspect(&completion.text, original);
        Ok(AttemptResult {
            text: completion.text,
            usage: completion.usage,
            suspicion,
        })
    }
}
