// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage accounting for the Glossa translation service.
//!
//! This crate provides:
//! - **Quota store**: per-user token limits and counters in SQLite, changed
//!   only by single atomic statements
//! - **Accountant**: the pre-flight quota check and post-translation charge
//! - **Ledger**: one row per charged translation, with monthly totals
//! - **Rollover**: the monthly snapshot-and-reset of usage counters

pub mod accountant;
pub mod ledger;
pub mod rollover;
pub mod store;

pub use accountant::{count_words, UsageAccountant};
pub use ledger::{LedgerEntry, LedgerTotals, UsageLedger};
pub use rollover::{roll_over_month, RolloverReport};
pub use store::SqliteQuotaStore;
