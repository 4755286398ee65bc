// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Similarity search over previously translated sentence pairs.

use async_trait::async_trait;

use crate::error::GlossaError;
use crate::types::{ExamplePair, Language};

#[async_trait]
pub trait ExampleRetriever: Send + Sync {
    /// Returns pairs most similar to `query`, best match first, whose combined
    /// character length stays below `max_total_chars`.
    async fn find_similar_examples(
        &self,
        query: &str,
        source: Language,
        target: Language,
        max_total_chars: usize,
    ) -> Result<Vec<ExamplePair>, GlossaError>;
}
