// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed per-user quota counters.

use async_trait::async_trait;
use glossa_core::{GlossaError, QuotaStore, UsageCharge, UsageIncrement, UsageSnapshot};
use glossa_storage::{map_tr_err, Database};
use rusqlite::{params, TransactionBehavior};

fn to_sql(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Quota counters in the `user_usage` table.
#[derive(Debug, Clone)]
pub struct SqliteQuotaStore {
    db: Database,
}

impl SqliteQuotaStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates the user's quota row, or changes the limit of an existing one.
    pub async fn set_limit(&self, user_id: &str, tokens_limit: u64) -> Result<(), GlossaError> {
        let user_id = user_id.to_string();
        let limit = to_sql(tokens_limit);
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO user_usage (user_id, tokens_limit) VALUES (?1, ?2)
                     ON CONFLICT(user_id) DO UPDATE SET
                        tokens_limit = excluded.tokens_limit,
                        updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                    params![user_id, limit],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Blocks or unblocks a user.
    pub async fn set_blocked(&self, user_id: &str, blocked: bool) -> Result<(), GlossaError> {
        let id = user_id.to_string();
        let updated = self
            .db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE user_usage SET is_blocked = ?2,
                        updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE user_id = ?1",
                    params![id, blocked],
                )
            })
            .await
            .map_err(map_tr_err)?;
        if updated == 0 {
            return Err(GlossaError::NotFound(format!("user `{user_id}`")));
        }
        Ok(())
    }
}

#[async_trait]
impl QuotaStore for SqliteQuotaStore {
    async fn usage_snapshot(&self, user_id: &str) -> Result<Option<UsageSnapshot>, GlossaError> {
        let user_id = user_id.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let result = conn.query_row(
                    "SELECT tokens_limit, tokens_used_total, tokens_used_month,
                            words_translated_month, is_blocked
                     FROM user_usage WHERE user_id = ?1",
                    params![user_id],
                    |row| {
                        Ok(UsageSnapshot {
                            tokens_limit: from_sql(row.get(0)?),
                            tokens_used_total: from_sql(row.get(1)?),
                            tokens_used_month: from_sql(row.get(2)?),
                            words_translated_month: from_sql(row.get(3)?),
                            is_blocked: row.get(4)?,
                        })
                    },
                );
                match result {
                    Ok(snapshot) => Ok(Some(snapshot)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    async fn atomic_increment_usage(
        &self,
        user_id: &str,
        increment: UsageIncrement,
    ) -> Result<UsageCharge, GlossaError> {
        let id = user_id.to_string();
        let tokens = to_sql(increment.tokens);
        let words = to_sql(increment.words);

        let charged: Option<i64> = self
            .db
            .connection()
            .call(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let before: i64 = match tx.query_row(
                    "SELECT tokens_used_total FROM user_usage WHERE user_id = ?1",
                    params![id],
                    |row| row.get(0),
                ) {
                    Ok(v) => v,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e),
                };
                // The clamp is evaluated against the pre-update total, so the
                // total can never pass the limit.
                tx.execute(
                    "UPDATE user_usage SET
                        tokens_used_total = tokens_used_total
                            + MIN(?2, MAX(tokens_limit - tokens_used_total, 0)),
                        tokens_used_month = tokens_used_month
                            + MIN(?2, MAX(tokens_limit - tokens_used_total, 0)),
                        words_translated_month = words_translated_month + ?3,
                        updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE user_id = ?1",
                    params![id, tokens, words],
                )?;
                let after: i64 = tx.query_row(
                    "SELECT tokens_used_total FROM user_usage WHERE user_id = ?1",
                    params![id],
                    |row| row.get(0),
                )?;
                tx.commit()?;
                Ok(Some(after - before))
            })
            .await
            .map_err(map_tr_err)?;

        let charged = charged.ok_or_else(|| GlossaError::NotFound(format!("user `{user_id}`")))?;
        Ok(UsageCharge {
            requested_tokens: increment.tokens,
            charged_tokens: from_sql(charged),
            words: increment.words,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_user(limit: u64) -> SqliteQuotaStore {
        let db = Database::open_in_memory().await.unwrap();
        let store = SqliteQuotaStore::new(db);
        store.set_limit("u1", limit).await.unwrap();
        store
    }

    #[tokio::test]
    async fn unknown_user_has_no_snapshot() {
        let store = store_with_user(100).await;
        assert!(store.usage_snapshot("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn increment_charges_tokens_and_words() {
        let store = store_with_user(1000).await;
        let charge = store
            .atomic_increment_usage("u1", UsageIncrement { tokens: 120, words: 7 })
            .await
            .unwrap();
        assert_eq!(charge.charged_tokens, 120);

        let snap = store.usage_snapshot("u1").await.unwrap().unwrap();
        assert_eq!(snap.tokens_used_total, 120);
        assert_eq!(snap.tokens_used_month, 120);
        assert_eq!(snap.words_translated_month, 7);
    }

    #[tokio::test]
    async fn increment_clamps_at_limit_but_counts_words() {
        let store = store_with_user(100).await;
        store
            .atomic_increment_usage("u1", UsageIncrement { tokens: 90, words: 1 })
            .await
            .unwrap();
        let charge = store
            .atomic_increment_usage("u1", UsageIncrement { tokens: 50, words: 4 })
            .await
            .unwrap();
        assert_eq!(charge.requested_tokens, 50);
        assert_eq!(charge.charged_tokens, 10);

        let snap = store.usage_snapshot("u1").await.unwrap().unwrap();
        assert_eq!(snap.tokens_used_total, 100);
        assert_eq!(snap.tokens_used_month, 100);
        assert_eq!(snap.words_translated_month, 5);

        let charge = store
            .atomic_increment_usage("u1", UsageIncrement { tokens: 5, words: 2 })
            .await
            .unwrap();
        assert_eq!(charge.charged_tokens, 0);
    }

    #[tokio::test]
    async fn increment_for_unknown_user_is_not_found() {
        let store = store_with_user(100).await;
        let err = store
            .atomic_increment_usage("ghost", UsageIncrement { tokens: 1, words: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, GlossaError::NotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_increments_never_exceed_limit() {
        let store = store_with_user(1000).await;
        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .atomic_increment_usage("u1", UsageIncrement { tokens: 75, words: 1 })
                    .await
                    .unwrap()
            }));
        }
        let mut charged = 0;
        for handle in handles {
            charged += handle.await.unwrap().charged_tokens;
        }
        assert_eq!(charged, 1000);
        let snap = store.usage_snapshot("u1").await.unwrap().unwrap();
        assert_eq!(snap.tokens_used_total, 1000);
        assert_eq!(snap.words_translated_month, 20);
    }

    #[tokio::test]
    async fn blocking_unknown_user_fails() {
        let store = store_with_user(10).await;
        store.set_blocked("u1", true).await.unwrap();
        assert!(store.usage_snapshot("u1").await.unwrap().unwrap().is_blocked);
        assert!(matches!(
            store.set_blocked("ghost", true).await,
            Err(GlossaError::NotFound(_))
        ));
    }
}
