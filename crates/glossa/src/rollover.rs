// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `glossa rollover` command implementation.

use chrono::Utc;
use glossa_config::GlossaConfig;
use glossa_core::GlossaError;
use glossa_storage::Database;

/// Closes the month ending now. Meant to run from cron on the first of the month.
pub async fn run_rollover(config: GlossaConfig) -> Result<(), GlossaError> {
    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    let report = glossa_usage::roll_over_month(&db, Utc::now()).await?;
    println!(
        "rollover complete: {} users recorded, {} users reset (period end {})",
        report.users_recorded,
        report.users_reset,
        report.period_end.to_rfc3339()
    );
    Ok(())
}
