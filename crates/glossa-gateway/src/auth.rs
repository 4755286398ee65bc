// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request authentication and caller identity.
//!
//! End-user authentication happens upstream. The gateway optionally checks a
//! shared bearer token on `/v1/*` and takes the caller's id from `X-User-Id`.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::handlers::ApiFailure;

/// Header carrying the authenticated caller's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Shared-secret check applied to the `/v1` routes.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Expected bearer token. `None` disables the check.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = if self.bearer_token.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("AuthConfig").field("bearer_token", &token).finish()
    }
}

/// Rejects requests without the configured bearer token.
pub async fn require_bearer(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(expected) = auth.bearer_token.as_deref() {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected);
        if !authorized {
            tracing::debug!(uri = %request.uri(), "bearer token missing or wrong");
            return Err(StatusCode::UNAUTHORIZED);
        }
    }
    Ok(next.run(request).await)
}

/// The caller's user id, taken from [`USER_ID_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for CallerId {
    type Rejection = ApiFailure;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| CallerId(v.to_string()))
            .ok_or_else(|| {
                ApiFailure::new(
                    StatusCode::UNAUTHORIZED,
                    "Unauthorized",
                    "missing X-User-Id header",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_the_token() {
        let auth = AuthConfig {
            bearer_token: Some("s3cret".into()),
        };
        let debug = format!("{auth:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("<set>"));
        assert!(format!("{:?}", AuthConfig::default()).contains("<unset>"));
    }
}
