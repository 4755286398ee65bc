// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Glossa translation service.
//!
//! This crate provides the error taxonomy, the document and conversation
//! model, and the collaborator traits (completion provider, example
//! retrieval, quota storage, document storage) that the pipeline crates
//! are written against.

pub mod document;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use document::Document;
pub use error::{ErrorKind, GlossaError, ProviderFailure};
pub use types::{
    Block, Completion, CompletionRequest, ConversationMessage, EditKind, ExamplePair, Language,
    PromptMessage, ProviderResponse, Role, TokenUsage, TranslateOptions, TranslationBlock,
    TranslationOutcome, UsageCharge, UsageIncrement, UsageSnapshot,
};

// Re-export all collaborator traits at crate root.
pub use traits::{CompletionProvider, DocumentStore, ExampleRetriever, QuotaStore};
