// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! The translation pipeline is written against these traits and never
//! against a concrete HTTP client or database. All traits use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod documents;
pub mod provider;
pub mod quota;
pub mod retrieval;

pub use documents::DocumentStore;
pub use provider::CompletionProvider;
pub use quota::QuotaStore;
pub use retrieval::ExampleRetriever;
