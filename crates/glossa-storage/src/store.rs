// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementations of the document and example-retrieval collaborators.

use async_trait::async_trait;
use glossa_core::{Document, DocumentStore, ExamplePair, ExampleRetriever, GlossaError, Language};
use tracing::debug;

use crate::database::Database;
use crate::queries;

/// Candidate pairs fetched from the index before the character budget is applied.
const CANDIDATE_LIMIT: usize = 50;

/// SQLite-backed [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    db: Database,
}

impl SqliteDocumentStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn load_document(
        &self,
        slug: &str,
        owner: &str,
    ) -> Result<Option<Document>, GlossaError> {
        queries::documents::get_document(&self.db, slug, owner).await
    }

    async fn save_document(&self, document: &Document) -> Result<(), GlossaError> {
        queries::documents::upsert_document(&self.db, document).await
    }
}

/// Translation memory searched with FTS5 BM25 ranking.
#[derive(Debug, Clone)]
pub struct SqliteExampleStore {
    db: Database,
}

impl SqliteExampleStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Adds a pair to the translation memory.
    pub async fn add_example(
        &self,
        source_lang: Language,
        target_lang: Language,
        pair: &ExamplePair,
    ) -> Result<(), GlossaError> {
        queries::examples::insert_example(&self.db, source_lang, target_lang, pair).await?;
        Ok(())
    }
}

/// Keeps pairs in rank order until the next one would push the total past
/// `max_total_chars`.
pub fn take_within_budget(pairs: Vec<ExamplePair>, max_total_chars: usize) -> Vec<ExamplePair> {
    let mut used = 0;
    let mut kept = Vec::new();
    for pair in pairs {
        let len = pair.char_len();
        if used + len > max_total_chars {
            break;
        }
        used += len;
        kept.push(pair);
    }
    kept
}

#[async_trait]
impl ExampleRetriever for SqliteExampleStore {
    async fn find_similar_examples(
        &self,
        query: &str,
        source: Language,
        target: Language,
        max_total_chars: usize,
    ) -> Result<Vec<ExamplePair>, GlossaError> {
        if max_total_chars == 0 {
            return Ok(Vec::new());
        }
        let candidates =
            queries::examples::search_examples(&self.db, query, source, target, CANDIDATE_LIMIT)
                .await?;
        let found = candidates.len();
        let kept = take_within_budget(candidates, max_total_chars);
        debug!(found, kept = kept.len(), max_total_chars, "example pairs retrieved");
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_stops_at_first_overflow() {
        let pairs = vec![
            ExamplePair::new("aaaa", "bbbb"),
            ExamplePair::new("cccccccc", "dddddddd"),
            ExamplePair::new("e", "f"),
        ];
        let kept = take_within_budget(pairs, 12);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].source, "aaaa");
    }

    #[test]
    fn budget_counts_characters_not_bytes() {
        let pairs = vec![ExamplePair::new("đá", "сланец")];
        assert_eq!(take_within_budget(pairs, 8).len(), 1);
    }

    #[tokio::test]
    async fn retriever_respects_budget() {
        let db = Database::open_in_memory().await.unwrap();
        let store = SqliteExampleStore::new(db);
        for i in 0..5 {
            store
                .add_example(
                    Language::Vn,
                    Language::Ru,
                    &ExamplePair::new(format!("giếng khoan số {i}"), format!("скважина номер {i}")),
                )
                .await
                .unwrap();
        }

        let all = store
            .find_similar_examples("giếng khoan", Language::Vn, Language::Ru, 10_000)
            .await
            .unwrap();
        assert_eq!(all.len(), 5);

        let one_pair = all[0].char_len();
        let limited = store
            .find_similar_examples("giếng khoan", Language::Vn, Language::Ru, one_pair + 1)
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);

        let none = store
            .find_similar_examples("giếng khoan", Language::Vn, Language::Ru, 0)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn document_store_round_trip() {
        let db = Database::open_in_memory().await.unwrap();
        let store = SqliteDocumentStore::new(db);
        let doc = Document::new("d1", "u1", Language::Vn, Language::Ru);
        store.save_document(&doc).await.unwrap();
        let loaded = store.load_document("d1", "u1").await.unwrap().unwrap();
        assert_eq!(loaded.slug, "d1");
        assert!(store.load_document("d1", "u2").await.unwrap().is_none());
    }
}
