// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::chats::ChatError;
use crate::credentials::CredentialError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Log the detail and return a generic 500.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidInput(_)
            | CredentialError::UsernameTaken(_)
            | CredentialError::NotFound(_) => ApiError::bad_request(err.to_string()),
            CredentialError::InvalidCredentials => ApiError::unauthorized(err.to_string()),
            CredentialError::Hashing(_) | CredentialError::Token(_) | CredentialError::Storage(_) => {
                ApiError::internal(err)
            }
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Validation(_)
            | ChatError::UnknownParticipant(_)
            | ChatError::ChatAlreadyExists
            | ChatError::ChatNotFound { .. } => ApiError::bad_request(err.to_string()),
            ChatError::NoParticipants => ApiError::conflict(err.to_string()),
            ChatError::Forbidden => ApiError::forbidden(err.to_string()),
            ChatError::Unauthorized => ApiError::unauthorized(err.to_string()),
            ChatError::IdentityUnavailable(_) | ChatError::Storage(_) => ApiError::internal(err),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InternalError(_) => ApiError::internal(err),
            other => ApiError::new(other.status_code(), other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chats::DirectoryError;
    use crate::storage::StorageError;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        assert_eq!(ApiError::unauthorized("x").status, StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status, StatusCode::FORBIDDEN);
        assert_eq!(ApiError::conflict("x").status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }

    #[test]
    fn chat_errors_map_to_statuses() {
        let cases = [
            (ChatError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ChatError::NoParticipants, StatusCode::CONFLICT),
            (ChatError::UnknownParticipant(vec!["@x".into()]), StatusCode::BAD_REQUEST),
            (ChatError::ChatAlreadyExists, StatusCode::BAD_REQUEST),
            (ChatError::ChatNotFound { name: "a".into(), id: 1 }, StatusCode::BAD_REQUEST),
            (ChatError::Forbidden, StatusCode::FORBIDDEN),
            (ChatError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                ChatError::IdentityUnavailable(DirectoryError::Timeout),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn credential_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(CredentialError::UsernameTaken("@a".into())).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(CredentialError::InvalidCredentials).status,
            StatusCode::UNAUTHORIZED
        );

        let internal = ApiError::from(CredentialError::Storage(StorageError::NotFound("x".into())));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.message, "internal server error");
    }

    #[test]
    fn unknown_participants_are_listed() {
        let err = ApiError::from(ChatError::UnknownParticipant(vec![
            "@ghost".into(),
            "@nobody".into(),
        ]));
        assert_eq!(err.message, "there are some non-existing users: @ghost, @nobody");
    }
}
