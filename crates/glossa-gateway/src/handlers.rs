// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use glossa_core::{Block, EditKind, ErrorKind, GlossaError, TranslationBlock};
use serde::{Deserialize, Serialize};

use crate::auth::CallerId;
use crate::server::{GatewayState, HealthState};

/// Request body for POST /v1/documents/{slug}/blocks.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBlockRequest {
    pub block: Block,
    pub edit_kind: EditKind,
    #[serde(default)]
    pub block_position_index: Option<usize>,
}

/// Request body for DELETE /v1/documents/{slug}/blocks.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBlocksRequest {
    pub block_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovedBlocks {
    pub removed: usize,
}

/// Envelope for successful responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub status: String,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    fn new(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

/// Envelope for failed responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
    pub message: String,
}

/// An error response with its HTTP status.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiFailure {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                status: "failure".to_string(),
                error: error.into(),
                message: message.into(),
            },
        }
    }
}

/// HTTP status for each caller-facing error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::RunOutOfTokens => StatusCode::PAYMENT_REQUIRED,
        ErrorKind::NotActivatedAccount | ErrorKind::BlockedUsage => StatusCode::FORBIDDEN,
        ErrorKind::ApiError => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<GlossaError> for ApiFailure {
    fn from(err: GlossaError) -> Self {
        let kind = err.kind();
        let status = status_for(kind);
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, "request failed");
            "internal error".to_string()
        } else {
            tracing::debug!(error = %err, %kind, "request rejected");
            err.to_string()
        };
        Self::new(status, kind.to_string(), message)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Queue section of the health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueHealth {
    pub active: usize,
    pub pending: usize,
}

/// Response body for GET /health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub provider: String,
    pub queue: QueueHealth,
}

/// POST /v1/documents/{slug}/blocks
///
/// Translates a new or edited block and stores it in the caller's document.
pub async fn post_block(
    State(state): State<GatewayState>,
    CallerId(user_id): CallerId,
    Path(slug): Path<String>,
    Json(body): Json<EditBlockRequest>,
) -> Result<Json<SuccessResponse<TranslationBlock>>, ApiFailure> {
    let translated = state
        .editor
        .edit_block(
            &user_id,
            &slug,
            body.block,
            body.edit_kind,
            body.block_position_index,
        )
        .await?;
    Ok(Json(SuccessResponse::new(translated)))
}

/// DELETE /v1/documents/{slug}/blocks
pub async fn delete_blocks(
    State(state): State<GatewayState>,
    CallerId(user_id): CallerId,
    Path(slug): Path<String>,
    Json(body): Json<RemoveBlocksRequest>,
) -> Result<Json<SuccessResponse<RemovedBlocks>>, ApiFailure> {
    let removed = state
        .editor
        .remove_blocks(&user_id, &slug, &body.block_ids)
        .await?;
    Ok(Json(SuccessResponse::new(RemovedBlocks { removed })))
}

/// GET /health
///
/// Unauthenticated liveness probe with queue counters.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let stats = state.editor.queue_stats();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: uptime_secs(&state.health),
        provider: state.editor.provider_name().to_string(),
        queue: QueueHealth {
            active: stats.active,
            pending: stats.pending,
        },
    })
}

fn uptime_secs(health: &HealthState) -> u64 {
    health.start_time.elapsed().as_secs()
}
