// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Glossa translation service.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, typed queries for documents and the
//! example translation memory, and the [`DocumentStore`](glossa_core::DocumentStore)
//! and [`ExampleRetriever`](glossa_core::ExampleRetriever) implementations.

pub mod database;
pub mod migrations;
pub mod queries;
pub mod store;

pub use database::{map_tr_err, Database};
pub use store::{SqliteDocumentStore, SqliteExampleStore};
