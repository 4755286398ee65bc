// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document edits that go through the translation pipeline.
//!
//! Every edit follows the same order: load the caller's document, resolve
//! where the block lands, check the quota, translate, splice the result in,
//! save, charge the usage. Nothing reaches the provider until the document
//! and quota checks have passed.
//!
//! Edits of one document run one at a time: each edit replays the history the
//! previous one saved, and a save rewrites the whole document.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use glossa_core::{
    Block, DocumentStore, EditKind, GlossaError, TranslateOptions, TranslationBlock,
};
use glossa_resilience::QueueStats;
use glossa_translate::Translator;
use glossa_usage::UsageAccountant;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

type DocumentKey = (String, String);

/// One async lock per `(owner, slug)` that currently has an edit in flight.
#[derive(Clone, Default)]
struct DocumentLocks {
    held: Arc<Mutex<HashMap<DocumentKey, Arc<tokio::sync::Mutex<()>>>>>,
}

impl DocumentLocks {
    async fn acquire(&self, owner: &str, slug: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
            // Only the map still points at idle locks.
            held.retain(|_, lock| Arc::strong_count(lock) > 1);
            held.entry((owner.to_string(), slug.to_string()))
                .or_default()
                .clone()
        };
        lock.lock_owned().await
    }
}

#[derive(Clone)]
pub struct DocumentEditor {
    documents: Arc<dyn DocumentStore>,
    accountant: UsageAccountant,
    translator: Translator,
    locks: DocumentLocks,
}

impl DocumentEditor {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        accountant: UsageAccountant,
        translator: Translator,
    ) -> Self {
        Self {
            documents,
            accountant,
            translator,
            locks: DocumentLocks::default(),
        }
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.translator.queue_stats()
    }

    pub fn provider_name(&self) -> &str {
        self.translator.provider_name()
    }

    /// Translates a new or edited block of `slug` and stores the result.
    ///
    /// New blocks go to `position` (default: the end). Edited blocks keep
    /// their position and their earlier messages stop being replayed.
    pub async fn edit_block(
        &self,
        user_id: &str,
        slug: &str,
        block: Block,
        edit_kind: EditKind,
        position: Option<usize>,
    ) -> Result<TranslationBlock, GlossaError> {
        let _edit = self.locks.acquire(user_id, slug).await;
        let mut document = self
            .documents
            .load_document(slug, user_id)
            .await?
            .ok_or_else(|| GlossaError::NotFound(format!("document `{slug}`")))?;

        document.resolve_index(edit_kind, &block.id, position)?;
        self.accountant.check_quota(user_id).await?;

        let options = TranslateOptions {
            original_language: document.lang,
            target_language: document.translation_lang,
            edit_kind,
        };
        let outcome = self
            .translator
            .translate(&block, &document.messages_history, &options)
            .await?;

        let source_text = block.text.clone();
        let block_id = block.id.clone();
        let index = document.apply_translation(
            edit_kind,
            block,
            outcome.translated_block.clone(),
            position,
        )?;
        document.append_messages(outcome.new_messages);
        document.add_tokens(u64::from(outcome.usage.total_tokens));

        self.documents.save_document(&document).await?;
        let charge = self
            .accountant
            .record_translation(user_id, slug, &block_id, &outcome.usage, &source_text)
            .await?;

        info!(
            user_id,
            slug,
            block_id = %block_id,
            index,
            edit_kind = ?edit_kind,
            charged_tokens = charge.charged_tokens,
            "document block updated"
        );
        Ok(outcome.translated_block)
    }

    /// Removes blocks by id. Returns how many were removed.
    pub async fn remove_blocks(
        &self,
        user_id: &str,
        slug: &str,
        block_ids: &[String],
    ) -> Result<usize, GlossaError> {
        let _edit = self.locks.acquire(user_id, slug).await;
        let mut document = self
            .documents
            .load_document(slug, user_id)
            .await?
            .ok_or_else(|| GlossaError::NotFound(format!("document `{slug}`")))?;

        let removed = document.remove_blocks(block_ids);
        if removed > 0 {
            self.documents.save_document(&document).await?;
        }
        debug!(user_id, slug, removed, "blocks removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::{QuotaStore, Role};
    use glossa_test_utils::TestHarness;

    fn editor(harness: &TestHarness) -> DocumentEditor {
        DocumentEditor::new(
            Arc::new(harness.documents.clone()),
            harness.accountant.clone(),
            harness.translator.clone(),
        )
    }

    fn block(id: &str, text: &str) -> Block {
        Block {
            id: id.into(),
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn new_block_is_translated_charged_and_saved() {
        let harness = TestHarness::builder()
            .with_mock_responses(vec!["Привет".into()])
            .build()
            .await
            .unwrap();
        harness.create_user("u1", 1000).await.unwrap();
        harness.create_document("doc", "u1").await.unwrap();
        let editor = editor(&harness);

        let translated = editor
            .edit_block("u1", "doc", block("b1", "Xin chào"), EditKind::NewBlock, None)
            .await
            .unwrap();
        assert_eq!(translated.id, "b1");
        assert_eq!(translated.text, "Привет");

        let doc = harness.documents.load_document("doc", "u1").await.unwrap().unwrap();
        assert_eq!(doc.content.len(), 1);
        assert_eq!(doc.translation_content[0].text, "Привет");
        assert_eq!(doc.messages_history.len(), 3);
        assert_eq!(doc.messages_history[0].role, Role::System);
        assert_eq!(doc.tokens_used, 30);

        let usage = harness.quotas.usage_snapshot("u1").await.unwrap().unwrap();
        assert_eq!(usage.tokens_used_total, 30);
        assert_eq!(usage.words_translated_month, 2);
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.create_user("u1", 1000).await.unwrap();

        let err = editor(&harness)
            .edit_block("u1", "nope", block("b1", "Một"), EditKind::NewBlock, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GlossaError::NotFound(_)));
        assert_eq!(harness.mock_provider.call_count(), 0);
    }

    #[tokio::test]
    async fn documents_are_scoped_to_their_owner() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.create_user("u2", 1000).await.unwrap();
        harness.create_document("doc", "u1").await.unwrap();

        let err = editor(&harness)
            .edit_block("u2", "doc", block("b1", "Một"), EditKind::NewBlock, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GlossaError::NotFound(_)));
    }

    #[tokio::test]
    async fn editing_unknown_block_is_not_found_without_calls() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.create_user("u1", 1000).await.unwrap();
        harness.create_document("doc", "u1").await.unwrap();

        let err = editor(&harness)
            .edit_block("u1", "doc", block("ghost", "Một"), EditKind::EditBlock, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GlossaError::NotFound(_)));
        assert_eq!(harness.mock_provider.call_count(), 0);
    }

    #[tokio::test]
    async fn out_of_range_position_is_rejected() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.create_user("u1", 1000).await.unwrap();
        harness.create_document("doc", "u1").await.unwrap();

        let err = editor(&harness)
            .edit_block("u1", "doc", block("b1", "Một"), EditKind::NewBlock, Some(1))
            .await
            .unwrap_err();
        assert!(matches!(err, GlossaError::Validation(_)));
        assert_eq!(harness.mock_provider.call_count(), 0);
    }

    #[tokio::test]
    async fn blocked_user_never_reaches_the_provider() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.create_user("u1", 1000).await.unwrap();
        harness.quotas.set_blocked("u1", true).await.unwrap();
        harness.create_document("doc", "u1").await.unwrap();

        let err = editor(&harness)
            .edit_block("u1", "doc", block("b1", "Một"), EditKind::NewBlock, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GlossaError::BlockedUsage(_)));
        assert_eq!(harness.mock_provider.call_count(), 0);
    }

    #[tokio::test]
    async fn editing_a_block_replaces_it_and_detaches_old_messages() {
        let harness = TestHarness::builder()
            .with_mock_responses(vec!["Один".into(), "Один снова".into()])
            .build()
            .await
            .unwrap();
        harness.create_user("u1", 1000).await.unwrap();
        harness.create_document("doc", "u1").await.unwrap();
        let editor = editor(&harness);

        editor
            .edit_block("u1", "doc", block("b1", "Một"), EditKind::NewBlock, None)
            .await
            .unwrap();
        editor
            .edit_block("u1", "doc", block("b1", "Một lần nữa"), EditKind::EditBlock, None)
            .await
            .unwrap();

        let doc = harness.documents.load_document("doc", "u1").await.unwrap().unwrap();
        assert_eq!(doc.content.len(), 1);
        assert_eq!(doc.content[0].text, "Một lần nữa");
        assert_eq!(doc.translation_content[0].text, "Один снова");

        let for_b1: Vec<_> = doc
            .messages_history
            .iter()
            .filter(|m| m.relevant_block_id.as_deref() == Some("b1"))
            .collect();
        assert_eq!(for_b1.len(), 4);
        assert!(!for_b1[0].attach_to_prompt);
        assert!(!for_b1[1].attach_to_prompt);
        assert!(for_b1[2].attach_to_prompt);
        assert!(for_b1[3].attach_to_prompt);
        assert_eq!(doc.tokens_used, 60);
    }

    #[tokio::test]
    async fn new_block_can_be_inserted_at_a_position() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.create_user("u1", 1000).await.unwrap();
        harness.create_document("doc", "u1").await.unwrap();
        let editor = editor(&harness);

        for id in ["b1", "b2"] {
            editor
                .edit_block("u1", "doc", block(id, "Một"), EditKind::NewBlock, None)
                .await
                .unwrap();
        }
        editor
            .edit_block("u1", "doc", block("b0", "Không"), EditKind::NewBlock, Some(0))
            .await
            .unwrap();

        let doc = harness.documents.load_document("doc", "u1").await.unwrap().unwrap();
        let ids: Vec<_> = doc.content.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["b0", "b1", "b2"]);
        let translated: Vec<_> = doc.translation_content.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(translated, ["b0", "b1", "b2"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_edits_of_one_document_are_all_kept() {
        let harness = TestHarness::builder()
            .with_mock_responses(vec!["Один".into(), "Два".into()])
            .build()
            .await
            .unwrap();
        harness.create_user("u1", 1000).await.unwrap();
        harness.create_document("doc", "u1").await.unwrap();
        let editor = editor(&harness);

        let tasks: Vec<_> = [("b1", "Một"), ("b2", "Hai")]
            .into_iter()
            .map(|(id, text)| {
                let editor = editor.clone();
                tokio::spawn(async move {
                    editor
                        .edit_block("u1", "doc", block(id, text), EditKind::NewBlock, None)
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let doc = harness.documents.load_document("doc", "u1").await.unwrap().unwrap();
        let mut ids: Vec<_> = doc.content.iter().map(|b| b.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, ["b1", "b2"]);
        assert_eq!(doc.translation_content.len(), 2);
        // One system message plus a user/assistant pair per edit.
        assert_eq!(doc.messages_history.len(), 5);
        assert_eq!(doc.tokens_used, 60);

        let usage = harness.quotas.usage_snapshot("u1").await.unwrap().unwrap();
        assert_eq!(usage.tokens_used_total, doc.tokens_used);
    }

    #[tokio::test]
    async fn edits_of_different_documents_do_not_share_a_lock() {
        let locks = DocumentLocks::default();
        let _first = locks.acquire("u1", "a").await;
        let second = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            locks.acquire("u1", "b"),
        )
        .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn remove_blocks_drops_content_and_translation() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.create_user("u1", 1000).await.unwrap();
        harness.create_document("doc", "u1").await.unwrap();
        let editor = editor(&harness);
        for id in ["b1", "b2"] {
            editor
                .edit_block("u1", "doc", block(id, "Một"), EditKind::NewBlock, None)
                .await
                .unwrap();
        }

        let removed = editor
            .remove_blocks("u1", "doc", &["b1".to_string(), "zz".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let doc = harness.documents.load_document("doc", "u1").await.unwrap().unwrap();
        assert_eq!(doc.content.len(), 1);
        assert_eq!(doc.content[0].id, "b2");
        assert_eq!(doc.translation_content.len(), 1);
    }
}
