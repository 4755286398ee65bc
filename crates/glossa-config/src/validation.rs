// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-zero queue limits and prompt budgets that leave room for the input.

use crate::diagnostic::ConfigError;
use crate::model::{GlossaConfig, ProviderKind};

/// Characters reserved for the instruction scaffold around the input text.
pub const INSTRUCTION_OVERHEAD_CHARS: usize = 200;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns all collected validation errors (does not fail fast).
pub fn validate_config(config: &GlossaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    // Queue
    if config.queue.concurrency == 0 {
        fail("queue.concurrency must be at least 1".to_string());
    }
    if config.queue.interval_cap == 0 {
        fail("queue.interval_cap must be at least 1".to_string());
    }
    if config.queue.interval_secs == 0 {
        fail("queue.interval_secs must be at least 1".to_string());
    }
    if config.queue.task_timeout_secs == 0 {
        fail("queue.task_timeout_secs must be at least 1".to_string());
    }

    // Retry
    if config.retry.max_attempts == 0 {
        fail("retry.max_attempts must be at least 1".to_string());
    }
    if config.retry.multiplier < 1.0 {
        fail(format!(
            "retry.multiplier must be >= 1.0, got {}",
            config.retry.multiplier
        ));
    }
    if let Some(max) = config.retry.max_delay_secs
        && max < config.retry.starting_delay_secs
    {
        fail(format!(
            "retry.max_delay_secs ({max}) must not be below retry.starting_delay_secs ({})",
            config.retry.starting_delay_secs
        ));
    }

    // Prompt budgets
    let persona_len = config.prompt.persona.chars().count();
    let required = persona_len + config.translation.max_input_chars + INSTRUCTION_OVERHEAD_CHARS;
    if config.prompt.max_prompt_chars < required {
        fail(format!(
            "prompt.max_prompt_chars ({}) must leave room for the persona, the instruction \
             and translation.max_input_chars (needs at least {required})",
            config.prompt.max_prompt_chars
        ));
    }
    if config.prompt.persona.trim().is_empty() {
        fail("prompt.persona must not be empty".to_string());
    }

    // Translation
    if config.translation.max_input_chars == 0 {
        fail("translation.max_input_chars must be at least 1".to_string());
    }
    if config.translation.min_output_tokens > config.translation.max_output_tokens {
        fail(format!(
            "translation.min_output_tokens ({}) exceeds translation.max_output_tokens ({})",
            config.translation.min_output_tokens, config.translation.max_output_tokens
        ));
    }
    if config.translation.output_tokens_per_char <= 0.0 {
        fail("translation.output_tokens_per_char must be positive".to_string());
    }

    // Sanity
    if config.sanity.length_ratio <= 1.0 {
        fail(format!(
            "sanity.length_ratio must be greater than 1.0, got {}",
            config.sanity.length_ratio
        ));
    }
    if config.sanity.sentinel_markers.iter().any(|m| m.is_empty()) {
        fail("sanity.sentinel_markers must not contain empty strings".to_string());
    }

    // Provider
    if config.provider.kind == ProviderKind::Azure {
        if config.provider.azure_deployment.as_deref().is_none_or(str::is_empty) {
            fail("provider.azure_deployment is required when provider.kind = \"azure\"".to_string());
        }
        if config.provider.base_url.as_deref().is_none_or(str::is_empty) {
            fail("provider.base_url (the Azure resource endpoint) is required when provider.kind = \"azure\"".to_string());
        }
    }
    if !(0.0..=2.0).contains(&config.provider.temperature) {
        fail(format!(
            "provider.temperature must be within 0.0..=2.0, got {}",
            config.provider.temperature
        ));
    }

    // Storage
    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    // Gateway
    if config.gateway.host.trim().is_empty() {
        fail("gateway.host must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
