// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `glossa translate` command implementation.
//!
//! Runs one block through the full pipeline (queue, retries, sanity checks)
//! with an empty history. No document, quota or ledger is touched.

use glossa_config::GlossaConfig;
use glossa_core::{Block, EditKind, GlossaError, Language, TranslateOptions};
use glossa_resilience::{QueueSettings, WorkQueue};
use glossa_translate::Translator;
use tracing::info;

/// Runs the `glossa translate` command.
pub async fn run_translate(
    config: GlossaConfig,
    text: String,
    from: Language,
    to: Language,
) -> Result<(), GlossaError> {
    if from == to {
        return Err(GlossaError::Validation(
            "source and target language must differ".into(),
        ));
    }

    let provider = glossa_openai::build_provider(&config.provider)?;
    let queue = WorkQueue::new(QueueSettings::from(&config.queue));
    let translator = Translator::from_config(&config, provider, queue, None);

    let block = Block {
        id: "cli".to_string(),
        text,
    };
    let options = TranslateOptions {
        original_language: from,
        target_language: to,
        edit_kind: EditKind::NewBlock,
    };
    let outcome = translator.translate(&block, &[], &options).await?;

    info!(
        prompt_tokens = outcome.usage.prompt_tokens,
        completion_tokens = outcome.usage.completion_tokens,
        total_tokens = outcome.usage.total_tokens,
        "translation finished"
    );
    println!("{}", outcome.translated_block.text);
    Ok(())
}
