// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the translation pipeline and its collaborators.

use std::ops::{Add, AddAssign};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A document language.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    Ru,
    En,
    Vn,
}

impl Language {
    /// Human-readable language name used inside prompts.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Ru => "Russian",
            Language::En => "English",
            Language::Vn => "Vietnamese",
        }
    }
}

/// Author of a conversation message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A unit of source text to translate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "blockId")]
    pub id: String,
    pub text: String,
}

/// The translation of one [`Block`], sharing its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationBlock {
    #[serde(rename = "blockId")]
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_manually: Option<bool>,
}

/// One entry of a document's append-only conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_block_id: Option<String>,
    /// Whether the message may be replayed as context in later prompts.
    #[serde(default)]
    pub attach_to_prompt: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    /// Creates a message stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            relevant_block_id: None,
            attach_to_prompt: true,
            tokens: None,
            timestamp: Utc::now(),
        }
    }

    pub fn for_block(mut self, block_id: impl Into<String>) -> Self {
        self.relevant_block_id = Some(block_id.into());
        self
    }

    pub fn attached(mut self, attach: bool) -> Self {
        self.attach_to_prompt = attach;
        self
    }
}

/// Whether a translation creates a new block or replaces an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EditKind {
    #[default]
    #[serde(rename = "newOriginalBlock")]
    NewBlock,
    #[serde(rename = "editOriginalBlock")]
    EditBlock,
}

/// Per-call translation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateOptions {
    pub original_language: Language,
    pub target_language: Language,
    #[serde(default)]
    pub edit_kind: EditKind,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            original_language: Language::Vn,
            target_language: Language::Ru,
            edit_kind: EditKind::NewBlock,
        }
    }
}

/// Token counts reported by the provider for one or more completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.total_tokens == 0 && self.prompt_tokens == 0 && self.completion_tokens == 0
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_tokens.saturating_add(rhs.prompt_tokens),
            completion_tokens: self.completion_tokens.saturating_add(rhs.completion_tokens),
            total_tokens: self.total_tokens.saturating_add(rhs.total_tokens),
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: TokenUsage) {
        *self = *self + rhs;
    }
}

/// A chat message in the shape the provider consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Length of the content in characters, the unit every prompt budget uses.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

impl From<&ConversationMessage> for PromptMessage {
    fn from(msg: &ConversationMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

/// A provider-agnostic completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub messages: Vec<PromptMessage>,
    pub max_tokens: u32,
}

/// Raw provider answer; either field may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProviderResponse {
    pub text: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// A validated completion returned by the completion gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

/// A previously translated sentence pair used as a few-shot example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplePair {
    pub source: String,
    pub target: String,
}

impl ExamplePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Combined character length of both sides.
    pub fn char_len(&self) -> usize {
        self.source.chars().count() + self.target.chars().count()
    }
}

/// Quota counters of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub tokens_limit: u64,
    pub tokens_used_total: u64,
    pub tokens_used_month: u64,
    pub words_translated_month: u64,
    pub is_blocked: bool,
}

impl UsageSnapshot {
    /// Tokens still chargeable before the hard cap.
    pub fn remaining(&self) -> u64 {
        self.tokens_limit.saturating_sub(self.tokens_used_total)
    }
}

/// Requested usage increment for one translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsageIncrement {
    pub tokens: u64,
    pub words: u64,
}

/// What an atomic usage increment actually charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsageCharge {
    pub requested_tokens: u64,
    pub charged_tokens: u64,
    pub words: u64,
}

/// Result of a successful translation orchestration.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    pub translated_block: TranslationBlock,
    pub new_messages: Vec<ConversationMessage>,
    pub usage: TokenUsage,
}
