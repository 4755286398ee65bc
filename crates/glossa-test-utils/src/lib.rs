// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Glossa integration tests.
//!
//! Provides a scripted completion provider, a fixed example retriever, and a
//! harness that wires the whole pipeline over a temporary SQLite database.
//!
//! # Components
//!
//! - [`MockProvider`] - Completion provider replaying scripted outcomes
//! - [`StaticRetriever`] - Example retriever over a fixed list of pairs
//! - [`TestHarness`] - Temp database, stores, accountant and translator

pub mod harness;
pub mod mock_provider;
pub mod retriever;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_provider::MockProvider;
pub use retriever::StaticRetriever;
