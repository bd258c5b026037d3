// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::token::TokenError;

/// Authentication gate failures.
///
/// Clients only see the message. The error code is for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `auth_token` cookie on the request
    MissingSessionCookie,
    /// Token is not structurally a session token
    MalformedToken,
    /// Token signature is invalid or the token was altered
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token is valid but its user no longer exists
    UnknownSessionUser,
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingSessionCookie => "missing_session_cookie",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::UnknownSessionUser => "unknown_session_user",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingSessionCookie
            | AuthError::MalformedToken
            | AuthError::UnknownSessionUser => StatusCode::UNAUTHORIZED,
            AuthError::InvalidSignature | AuthError::TokenExpired => StatusCode::FORBIDDEN,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingSessionCookie => write!(f, "Authentication cookie is required"),
            AuthError::MalformedToken => write!(f, "Session token is malformed"),
            AuthError::InvalidSignature => write!(f, "Session token is invalid"),
            AuthError::TokenExpired => write!(f, "Session token has expired"),
            AuthError::UnknownSessionUser => write!(f, "Session user does not exist"),
            AuthError::InternalError(_) => write!(f, "Internal authentication error"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed => AuthError::MalformedToken,
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::InvalidSignature => AuthError::InvalidSignature,
            TokenError::Signing(msg) => AuthError::InternalError(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AuthError::InternalError(detail) => {
                tracing::error!(code = self.error_code(), detail = %detail, "Authentication failed")
            }
            _ => tracing::debug!(code = self.error_code(), "Authentication rejected"),
        }
        let body = Json(AuthErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_cookie_returns_401_with_message_only() {
        let response = AuthError::MissingSessionCookie.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error"], "Authentication cookie is required");
        assert!(body.get("error_code").is_none());
    }

    #[test]
    fn token_errors_map_to_gate_statuses() {
        assert_eq!(
            AuthError::from(TokenError::Malformed).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::from(TokenError::Expired).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::from(TokenError::InvalidSignature).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn internal_error_hides_detail() {
        let response = AuthError::InternalError("key material".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert!(!body.contains("key material"));
    }
}
