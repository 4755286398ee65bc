// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The translated document: parallel source and translation blocks plus the
//! conversation history that produced them.
//!
//! `content[i]` and `translation_content[i]` always describe the same block.
//! Every mutation below keeps that correspondence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GlossaError;
use crate::types::{Block, ConversationMessage, EditKind, Language, TranslationBlock};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub slug: String,
    pub owner: String,
    #[serde(default)]
    pub title: String,
    pub lang: Language,
    pub translation_lang: Language,
    #[serde(default)]
    pub content: Vec<Block>,
    #[serde(default)]
    pub translation_content: Vec<TranslationBlock>,
    #[serde(default)]
    pub messages_history: Vec<ConversationMessage>,
    #[serde(default)]
    pub tokens_used: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Creates an empty document owned by `owner`.
    pub fn new(
        slug: impl Into<String>,
        owner: impl Into<String>,
        lang: Language,
        translation_lang: Language,
    ) -> Self {
        let now = Utc::now();
        Self {
            slug: slug.into(),
            owner: owner.into(),
            title: String::new(),
            lang,
            translation_lang,
            content: Vec::new(),
            translation_content: Vec::new(),
            messages_history: Vec::new(),
            tokens_used: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Position of the block with the given id.
    pub fn block_index(&self, block_id: &str) -> Option<usize> {
        self.content.iter().position(|b| b.id == block_id)
    }

    /// Resolves where a translation of `block` will land, without mutating.
    ///
    /// New blocks go to `position` (or the end) and the position may not exceed
    /// the current length. Edited blocks must already exist.
    pub fn resolve_index(
        &self,
        kind: EditKind,
        block_id: &str,
        position: Option<usize>,
    ) -> Result<usize, GlossaError> {
        match kind {
            EditKind::NewBlock => {
                if self.block_index(block_id).is_some() {
                    return Err(GlossaError::Validation(format!(
                        "block `{block_id}` already exists"
                    )));
                }
                let index = position.unwrap_or(self.content.len());
                if index > self.content.len() {
                    return Err(GlossaError::Validation(format!(
                        "block position {index} is out of range (document has {} blocks)",
                        self.content.len()
                    )));
                }
                Ok(index)
            }
            EditKind::EditBlock => self
                .block_index(block_id)
                .ok_or_else(|| GlossaError::NotFound(format!("block `{block_id}`"))),
        }
    }

    /// Inserts or replaces a block together with its translation.
    ///
    /// Editing a block also detaches every earlier message that refers to it,
    /// so stale translations are no longer replayed as context.
    pub fn apply_translation(
        &mut self,
        kind: EditKind,
        block: Block,
        translated: TranslationBlock,
        position: Option<usize>,
    ) -> Result<usize, GlossaError> {
        let index = self.resolve_index(kind, &block.id, position)?;
        match kind {
            EditKind::NewBlock => {
                self.content.insert(index, block);
                let translation_index = index.min(self.translation_content.len());
                self.translation_content.insert(translation_index, translated);
            }
            EditKind::EditBlock => {
                self.invalidate_block_messages(&block.id);
                self.content[index] = block;
                match self.translation_content.get_mut(index) {
                    Some(slot) => *slot = translated,
                    None => self.translation_content.push(translated),
                }
            }
        }
        self.touch();
        Ok(index)
    }

    /// Marks every message tied to `block_id` as no longer attachable.
    pub fn invalidate_block_messages(&mut self, block_id: &str) -> usize {
        let mut count = 0;
        for msg in self
            .messages_history
            .iter_mut()
            .filter(|m| m.relevant_block_id.as_deref() == Some(block_id))
        {
            if msg.attach_to_prompt {
                msg.attach_to_prompt = false;
                count += 1;
            }
        }
        count
    }

    /// Removes blocks (and their translations) by id. Returns how many source
    /// blocks were removed.
    pub fn remove_blocks(&mut self, block_ids: &[String]) -> usize {
        let before = self.content.len();
        self.content.retain(|b| !block_ids.contains(&b.id));
        self.translation_content
            .retain(|t| !block_ids.contains(&t.id));
        for id in block_ids {
            self.invalidate_block_messages(id);
        }
        let removed = before - self.content.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    pub fn append_messages(&mut self, messages: impl IntoIterator<Item = ConversationMessage>) {
        self.messages_history.extend(messages);
    }

    pub fn add_tokens(&mut self, tokens: u64) {
        self.tokens_used = self.tokens_used.saturating_add(tokens);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
