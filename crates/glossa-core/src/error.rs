// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Glossa translation service.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// The primary error type used across all Glossa crates.
///
/// Only [`Validation`](GlossaError::Validation) and [`Api`](GlossaError::Api)
/// leave the translation orchestrator; the quota variants are produced by
/// usage accounting before any provider call is made.
#[derive(Debug, Error)]
pub enum GlossaError {
    /// Caller input rejected before any external work (oversized or blank text,
    /// bad block position).
    #[error("validation error: {0}")]
    Validation(String),

    /// The completion provider could not produce a usable completion.
    #[error("api error: {message}")]
    Api {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The user's token allowance is used up.
    #[error("run out of tokens: {0}")]
    RunOutOfTokens(String),

    /// The user has been blocked by an administrator.
    #[error("usage blocked: {0}")]
    BlockedUsage(String),

    /// The user's account has a zero token allowance.
    #[error("account not activated: {0}")]
    NotActivatedAccount(String),

    /// A user, document, or block does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration errors (invalid values, missing credentials).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GlossaError {
    /// Builds an [`Api`](GlossaError::Api) error without an underlying source.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            source: None,
        }
    }

    /// Returns the machine-readable kind used by the HTTP layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::Api { .. } => ErrorKind::ApiError,
            Self::RunOutOfTokens(_) => ErrorKind::RunOutOfTokens,
            Self::BlockedUsage(_) => ErrorKind::BlockedUsage,
            Self::NotActivatedAccount(_) => ErrorKind::NotActivatedAccount,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Config(_) => ErrorKind::ConfigError,
            Self::Storage { .. } => ErrorKind::StorageError,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Internal(_) => ErrorKind::InternalError,
        }
    }
}

/// Machine-readable error names, serialized verbatim into failure responses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum ErrorKind {
    ValidationError,
    ApiError,
    RunOutOfTokens,
    BlockedUsage,
    NotActivatedAccount,
    NotFound,
    ConfigError,
    StorageError,
    Timeout,
    InternalError,
}

/// Outcome of a single failed provider attempt, classified once at the HTTP boundary.
///
/// Transient failures are retried by the completion gateway; fatal failures
/// abort immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderFailure {
    /// Rate limiting, overload, or a transport hiccup. Worth another attempt.
    #[error("transient provider failure (status {status:?}): {message}")]
    Transient {
        status: Option<u16>,
        message: String,
    },

    /// Anything the provider will keep refusing (bad request, auth, malformed body).
    #[error("fatal provider failure (status {status:?}): {message}")]
    Fatal {
        status: Option<u16>,
        message: String,
    },
}

impl ProviderFailure {
    /// Returns true when the failure should be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// HTTP status attached to the failure, if the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transient { status, .. } | Self::Fatal { status, .. } => *status,
        }
    }
}
