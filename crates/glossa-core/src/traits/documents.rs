// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document persistence used by the document-edit flow.

use async_trait::async_trait;

use crate::document::Document;
use crate::error::GlossaError;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Loads a document by slug, scoped to its owner.
    async fn load_document(&self, slug: &str, owner: &str)
    -> Result<Option<Document>, GlossaError>;

    /// Inserts or replaces a document.
    async fn save_document(&self, document: &Document) -> Result<(), GlossaError>;
}
