// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed example retriever.

use async_trait::async_trait;
use glossa_core::{ExamplePair, ExampleRetriever, GlossaError, Language};
use glossa_storage::store::take_within_budget;

/// Returns the same pairs for every query, trimmed to the requested budget.
#[derive(Debug, Clone, Default)]
pub struct StaticRetriever {
    pairs: Vec<ExamplePair>,
}

impl StaticRetriever {
    pub fn new(pairs: Vec<ExamplePair>) -> Self {
        Self { pairs }
    }
}

#[async_trait]
impl ExampleRetriever for StaticRetriever {
    async fn find_similar_examples(
        &self,
        _query: &str,
        _source: Language,
        _target: Language,
        max_total_chars: usize,
    ) -> Result<Vec<ExamplePair>, GlossaError> {
        Ok(take_within_budget(self.pairs.clone(), max_total_chars))
    }
}
