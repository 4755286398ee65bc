// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline tests.
//!
//! `TestHarness` assembles the translation stack with a mock provider, a
//! temp SQLite database, quota and document stores, and a translator whose
//! queue and backoff are tuned for fast tests.

use std::sync::Arc;

use glossa_config::GlossaConfig;
use glossa_core::{
    Block, Document, DocumentStore, ExamplePair, ExampleRetriever, GlossaError, Language,
    ProviderFailure, ProviderResponse, TranslateOptions, TranslationOutcome,
};
use glossa_resilience::{QueueSettings, WorkQueue};
use glossa_storage::{Database, SqliteDocumentStore};
use glossa_translate::Translator;
use glossa_usage::{SqliteQuotaStore, UsageAccountant, UsageLedger};

use crate::mock_provider::MockProvider;
use crate::retriever::StaticRetriever;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    script: Vec<Result<ProviderResponse, ProviderFailure>>,
    examples: Vec<ExamplePair>,
    config: GlossaConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = GlossaConfig::default();
        // No real waiting in tests.
        config.retry.starting_delay_secs = 0;
        config.queue.interval_secs = 1;
        config.queue.interval_cap = 1000;
        config.queue.task_timeout_secs = 30;
        config.sanity.max_retranslations = 2;
        Self {
            script: Vec::new(),
            examples: Vec::new(),
            config,
        }
    }

    /// Set mock provider text responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.script = responses
            .iter()
            .map(|t| Ok(crate::mock_provider::text_response(t)))
            .collect();
        self
    }

    /// Set a full provider script, failures included.
    pub fn with_script(
        mut self,
        script: Vec<Result<ProviderResponse, ProviderFailure>>,
    ) -> Self {
        self.script = script;
        self
    }

    /// Example pairs served to the prompt composer.
    pub fn with_examples(mut self, examples: Vec<ExamplePair>) -> Self {
        self.examples = examples;
        self
    }

    /// Adjust the configuration before the stack is wired.
    pub fn with_config(mut self, adjust: impl FnOnce(&mut GlossaConfig)) -> Self {
        adjust(&mut self.config);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, GlossaError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| GlossaError::Storage {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("test.db");
        let db = Database::open(&db_path.to_string_lossy(), true).await?;

        let mock_provider = Arc::new(MockProvider::with_script(self.script));
        let queue = WorkQueue::new(QueueSettings::from(&self.config.queue));
        let retriever: Option<Arc<dyn ExampleRetriever>> = if self.examples.is_empty() {
            None
        } else {
            Some(Arc::new(StaticRetriever::new(self.examples)))
        };
        let translator =
            Translator::from_config(&self.config, mock_provider.clone(), queue.clone(), retriever);

        let quotas = SqliteQuotaStore::new(db.clone());
        let ledger = UsageLedger::new(db.clone());
        let accountant =
            UsageAccountant::new(Arc::new(quotas.clone())).with_ledger(ledger.clone());
        let documents = SqliteDocumentStore::new(db.clone());

        Ok(TestHarness {
            mock_provider,
            db,
            queue,
            quotas,
            ledger,
            accountant,
            documents,
            translator,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock provider and temp storage.
pub struct TestHarness {
    /// The mock completion provider.
    pub mock_provider: Arc<MockProvider>,
    /// Temp SQLite database, deleted on drop.
    pub db: Database,
    /// The work queue shared by the translator.
    pub queue: WorkQueue,
    pub quotas: SqliteQuotaStore,
    pub ledger: UsageLedger,
    /// Accountant writing to `quotas` and `ledger`.
    pub accountant: UsageAccountant,
    pub documents: SqliteDocumentStore,
    pub translator: Translator,
    /// Configuration the stack was built from.
    pub config: GlossaConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Registers a user with the given token limit.
    pub async fn create_user(
        &self,
        user_id: &str,
        tokens_limit: u64,
    ) -> Result<(), GlossaError> {
        self.quotas.set_limit(user_id, tokens_limit).await
    }

    /// Stores an empty Vietnamese to Russian document.
    pub async fn create_document(
        &self,
        slug: &str,
        owner: &str,
    ) -> Result<Document, GlossaError> {
        let document = Document::new(slug, owner, Language::Vn, Language::Ru);
        self.documents.save_document(&document).await?;
        Ok(document)
    }

    /// Runs one translation with no history and no persistence.
    pub async fn translate(&self, text: &str) -> Result<TranslationOutcome, GlossaError> {
        let block = Block {
            id: "test-block".into(),
            text: text.into(),
        };
        self.translator
            .translate(&block, &[], &TranslateOptions::default())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::QuotaStore;

    #[tokio::test]
    async fn harness_translates_with_mock_responses() {
        let harness = TestHarness::builder()
            .with_mock_responses(vec!["Привет".into()])
            .build()
            .await
            .unwrap();

        let outcome = harness.translate("Xin chào").await.unwrap();
        assert_eq!(outcome.translated_block.text, "Привет");
        assert_eq!(harness.mock_provider.call_count(), 1);
    }

    #[tokio::test]
    async fn harness_creates_users_and_documents() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.create_user("u1", 500).await.unwrap();
        harness.create_document("doc-1", "u1").await.unwrap();

        let snapshot = harness.quotas.usage_snapshot("u1").await.unwrap().unwrap();
        assert_eq!(snapshot.tokens_limit, 500);
        let loaded = harness.documents.load_document("doc-1", "u1").await.unwrap();
        assert!(loaded.is_some());
    }
}
