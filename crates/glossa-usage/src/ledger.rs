// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage ledger: one row per charged translation.
//!
//! The quota counters only say how much a user has spent; the ledger records
//! where it went (document, block, prompt/completion split, and how much of
//! the request was actually charged after the quota clamp).

use glossa_core::{GlossaError, TokenUsage, UsageCharge};
use glossa_storage::{map_tr_err, Database};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A single ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique record identifier (UUID v4).
    pub id: String,
    pub user_id: String,
    pub document_slug: Option<String>,
    pub block_id: Option<String>,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    /// Tokens reported by the provider for this translation.
    pub requested_tokens: u64,
    /// Tokens actually added to the user's counters.
    pub charged_tokens: u64,
    pub words: u64,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

impl LedgerEntry {
    pub fn new(
        user_id: impl Into<String>,
        document_slug: Option<String>,
        block_id: Option<String>,
        usage: &TokenUsage,
        charge: &UsageCharge,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            document_slug,
            block_id,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            requested_tokens: charge.requested_tokens,
            charged_tokens: charge.charged_tokens,
            words: charge.words,
            created_at: chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
        }
    }
}

/// Aggregated ledger figures for one user and period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub translations: u64,
    pub requested_tokens: u64,
    pub charged_tokens: u64,
    pub words: u64,
}

/// Persistent usage ledger in the `usage_ledger` table.
#[derive(Debug, Clone)]
pub struct UsageLedger {
    db: Database,
}

impl UsageLedger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Appends an entry.
    pub async fn record(&self, entry: &LedgerEntry) -> Result<(), GlossaError> {
        let row = entry.clone();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO usage_ledger (id, user_id, document_slug, block_id, \
                     prompt_tokens, completion_tokens, requested_tokens, charged_tokens, \
                     words, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    rusqlite::params![
                        row.id,
                        row.user_id,
                        row.document_slug,
                        row.block_id,
                        row.prompt_tokens,
                        row.completion_tokens,
                        i64::try_from(row.requested_tokens).unwrap_or(i64::MAX),
                        i64::try_from(row.charged_tokens).unwrap_or(i64::MAX),
                        i64::try_from(row.words).unwrap_or(i64::MAX),
                        row.created_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        info!(
            user_id = %entry.user_id,
            document = entry.document_slug.as_deref().unwrap_or("-"),
            requested_tokens = entry.requested_tokens,
            charged_tokens = entry.charged_tokens,
            words = entry.words,
            "usage recorded"
        );
        Ok(())
    }

    /// Totals of a user for a year-month prefix (e.g. "2026-03").
    pub async fn monthly_totals(
        &self,
        user_id: &str,
        year_month: &str,
    ) -> Result<LedgerTotals, GlossaError> {
        let user_id = user_id.to_string();
        let prefix = format!("{year_month}%");
        let (translations, requested, charged, words): (i64, i64, i64, i64) = self
            .db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(requested_tokens), 0), \
                     COALESCE(SUM(charged_tokens), 0), COALESCE(SUM(words), 0) \
                     FROM usage_ledger WHERE user_id = ?1 AND created_at LIKE ?2",
                    rusqlite::params![user_id, prefix],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
            })
            .await
            .map_err(map_tr_err)?;

        Ok(LedgerTotals {
            translations: u64::try_from(translations).unwrap_or(0),
            requested_tokens: u64::try_from(requested).unwrap_or(0),
            charged_tokens: u64::try_from(charged).unwrap_or(0),
            words: u64::try_from(words).unwrap_or(0),
        })
    }
}
