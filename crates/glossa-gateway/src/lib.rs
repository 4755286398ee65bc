// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Glossa translation service.
//!
//! Exposes block translation and removal for a caller's documents over axum.
//! Handlers delegate to [`DocumentEditor`], which runs quota checks, the
//! translation pipeline and persistence in a fixed order.

pub mod auth;
pub mod editor;
pub mod handlers;
pub mod server;

pub use auth::{AuthConfig, CallerId};
pub use editor::DocumentEditor;
pub use handlers::{ApiFailure, ErrorResponse, SuccessResponse};
pub use server::{build_router, start_server, GatewayState, HealthState, ServerConfig};
