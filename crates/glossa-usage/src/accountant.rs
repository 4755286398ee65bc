// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quota enforcement around a translation.
//!
//! [`UsageAccountant::check_quota`] runs before any provider call and
//! [`UsageAccountant::record_usage`] charges the result afterwards. A
//! translation that overshoots the remaining allowance is clamped to the cap;
//! nothing is refunded.

use std::sync::Arc;

use glossa_core::{GlossaError, QuotaStore, TokenUsage, UsageCharge, UsageIncrement, UsageSnapshot};
use tracing::{debug, warn};

use crate::ledger::{LedgerEntry, UsageLedger};

/// Share of the limit at which a warning is logged.
const WARN_RATIO: f64 = 0.8;

/// Number of whitespace-separated words in `text`.
pub fn count_words(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

/// Pre-flight quota checks and post-translation charging.
#[derive(Clone)]
pub struct UsageAccountant {
    store: Arc<dyn QuotaStore>,
    ledger: Option<UsageLedger>,
}

impl UsageAccountant {
    pub fn new(store: Arc<dyn QuotaStore>) -> Self {
        Self {
            store,
            ledger: None,
        }
    }

    /// Also writes a ledger row for every charged translation.
    pub fn with_ledger(mut self, ledger: UsageLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Fails unless the user may start another translation.
    ///
    /// Checked in order: blocked, not activated (zero limit), out of tokens.
    pub async fn check_quota(&self, user_id: &str) -> Result<UsageSnapshot, GlossaError> {
        let snapshot = self
            .store
            .usage_snapshot(user_id)
            .await?
            .ok_or_else(|| GlossaError::NotFound(format!("user `{user_id}`")))?;

        if snapshot.is_blocked {
            return Err(GlossaError::BlockedUsage(
                "usage of this account has been blocked".into(),
            ));
        }
        if snapshot.tokens_limit == 0 {
            return Err(GlossaError::NotActivatedAccount(
                "this account has no token allowance yet".into(),
            ));
        }
        if snapshot.tokens_used_total >= snapshot.tokens_limit {
            return Err(GlossaError::RunOutOfTokens(format!(
                "token limit of {} reached",
                snapshot.tokens_limit
            )));
        }

        if snapshot.tokens_used_total as f64 >= snapshot.tokens_limit as f64 * WARN_RATIO {
            warn!(
                user_id,
                used = snapshot.tokens_used_total,
                limit = snapshot.tokens_limit,
                "approaching token limit (80%+)"
            );
        }

        Ok(snapshot)
    }

    /// Charges `tokens` (clamped to the remaining allowance) and `words`.
    pub async fn record_usage(
        &self,
        user_id: &str,
        tokens: u64,
        words: u64,
    ) -> Result<UsageCharge, GlossaError> {
        let charge = self
            .store
            .atomic_increment_usage(user_id, UsageIncrement { tokens, words })
            .await?;
        if charge.charged_tokens < charge.requested_tokens {
            warn!(
                user_id,
                requested = charge.requested_tokens,
                charged = charge.charged_tokens,
                "translation overshot the token limit, charge clamped"
            );
        } else {
            debug!(user_id, tokens, words, "usage charged");
        }
        Ok(charge)
    }

    /// Charges one translation of `source_text` and writes its ledger row.
    pub async fn record_translation(
        &self,
        user_id: &str,
        document_slug: &str,
        block_id: &str,
        usage: &TokenUsage,
        source_text: &str,
    ) -> Result<UsageCharge, GlossaError> {
        let charge = self
            .record_usage(user_id, u64::from(usage.total_tokens), count_words(source_text))
            .await?;
        if let Some(ledger) = &self.ledger {
            let entry = LedgerEntry::new(
                user_id,
                Some(document_slug.to_string()),
                Some(block_id.to_string()),
                usage,
                &charge,
            );
            ledger.record(&entry).await?;
        }
        Ok(charge)
    }
}
