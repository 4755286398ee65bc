// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent per-user quota counters.

use async_trait::async_trait;

use crate::error::GlossaError;
use crate::types::{UsageCharge, UsageIncrement, UsageSnapshot};

/// Backing store for per-user token quotas.
///
/// Increments must be a single atomic read-modify-write so concurrent
/// charges for the same user can never push `tokens_used_total` past
/// `tokens_limit`.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Current counters for a user, or `None` if the user is unknown.
    async fn usage_snapshot(&self, user_id: &str) -> Result<Option<UsageSnapshot>, GlossaError>;

    /// Charges `min(increment.tokens, limit - used)` tokens and all words.
    async fn atomic_increment_usage(
        &self,
        user_id: &str,
        increment: UsageIncrement,
    ) -> Result<UsageCharge, GlossaError>;
}
