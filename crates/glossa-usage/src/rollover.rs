// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Monthly rollover of usage counters.
//!
//! Every user who spent tokens this month gets a `usage_history` row with the
//! month's tokens, words and the number of documents they changed; then all
//! month counters are reset. Both steps run in one transaction.

use chrono::{DateTime, Months, SecondsFormat, Utc};
use glossa_core::GlossaError;
use glossa_storage::{map_tr_err, Database};
use rusqlite::{params, TransactionBehavior};
use tracing::info;

/// What a rollover did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloverReport {
    /// Users whose month was written to the history.
    pub users_recorded: usize,
    /// Users whose month counters were reset.
    pub users_reset: usize,
    pub period_end: DateTime<Utc>,
}

/// Closes the month ending at `period_end`.
pub async fn roll_over_month(
    db: &Database,
    period_end: DateTime<Utc>,
) -> Result<RolloverReport, GlossaError> {
    let period_start = period_end
        .checked_sub_months(Months::new(1))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let start = period_start.to_rfc3339_opts(SecondsFormat::Millis, true);
    let end = period_end.to_rfc3339_opts(SecondsFormat::Millis, true);

    let (users_recorded, users_reset) = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let recorded = tx.execute(
                "INSERT INTO usage_history (user_id, tokens_used_month, words_translated_month,
                                            documents_changed_month, period_end)
                 SELECT u.user_id, u.tokens_used_month, u.words_translated_month,
                        (SELECT COUNT(*) FROM documents d
                          WHERE d.owner = u.user_id
                            AND d.updated_at > ?1 AND d.updated_at <= ?2),
                        ?2
                 FROM user_usage u
                 WHERE u.tokens_used_month > 0",
                params![start, end],
            )?;
            let reset = tx.execute(
                "UPDATE user_usage SET tokens_used_month = 0, words_translated_month = 0,
                        updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE tokens_used_month > 0 OR words_translated_month > 0",
                [],
            )?;
            tx.commit()?;
            Ok((recorded, reset))
        })
        .await
        .map_err(map_tr_err)?;

    info!(
        users_recorded,
        users_reset,
        period_end = %period_end,
        "monthly usage rolled over"
    );

    Ok(RolloverReport {
        users_recorded,
        users_reset,
        period_end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteQuotaStore;
    use glossa_core::{Document, DocumentStore, Language, QuotaStore, UsageIncrement};
    use glossa_storage::SqliteDocumentStore;

    async fn history_rows(db: &Database) -> Vec<(String, i64, i64, i64)> {
        db.connection()
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT user_id, tokens_used_month, words_translated_month,
                            documents_changed_month
                     FROM usage_history ORDER BY user_id",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)
            .unwrap()
    }

    #[tokio::test]
    async fn snapshots_active_users_and_resets_counters() {
        let db = Database::open_in_memory().await.unwrap();
        let quotas = SqliteQuotaStore::new(db.clone());
        let docs = SqliteDocumentStore::new(db.clone());

        quotas.set_limit("active", 1000).await.unwrap();
        quotas.set_limit("idle", 1000).await.unwrap();
        quotas
            .atomic_increment_usage("active", UsageIncrement { tokens: 300, words: 40 })
            .await
            .unwrap();
        docs.save_document(&Document::new("d1", "active", Language::Vn, Language::Ru))
            .await
            .unwrap();
        docs.save_document(&Document::new("d2", "active", Language::Vn, Language::Ru))
            .await
            .unwrap();

        let report = roll_over_month(&db, Utc::now() + chrono::Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(report.users_recorded, 1);
        assert_eq!(report.users_reset, 1);

        let rows = history_rows(&db).await;
        assert_eq!(rows, vec![("active".to_string(), 300, 40, 2)]);

        let snap = quotas.usage_snapshot("active").await.unwrap().unwrap();
        assert_eq!(snap.tokens_used_month, 0);
        assert_eq!(snap.words_translated_month, 0);
        assert_eq!(snap.tokens_used_total, 300);
    }

    #[tokio::test]
    async fn second_rollover_records_nothing() {
        let db = Database::open_in_memory().await.unwrap();
        let quotas = SqliteQuotaStore::new(db.clone());
        quotas.set_limit("u1", 100).await.unwrap();
        quotas
            .atomic_increment_usage("u1", UsageIncrement { tokens: 10, words: 1 })
            .await
            .unwrap();

        roll_over_month(&db, Utc::now()).await.unwrap();
        let report = roll_over_month(&db, Utc::now()).await.unwrap();
        assert_eq!(report.users_recorded, 0);
        assert_eq!(history_rows(&db).await.len(), 1);
    }
}
