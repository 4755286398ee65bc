// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Glossa translation pipeline.
//!
//! [`Translator`] is the entry point. It normalizes a block, has the
//! [`PromptComposer`] build a budgeted prompt, sends it through the
//! [`CompletionGateway`] (queue, retries, response validation) and re-asks
//! while the [`OutputSanityChecker`] rejects the answer.

pub mod gateway;
pub mod normalize;
pub mod prompt;
pub mod sanity;
pub mod translator;

#[cfg(test)]
mod test_support;

pub use gateway::CompletionGateway;
pub use normalize::{max_output_tokens, normalize_input};
pub use prompt::{ComposedPrompt, PromptBudgets, PromptComposer, PromptStats};
pub use sanity::{OutputSanityChecker, Suspicion};
pub use translator::Translator;
