// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};

use crate::{
    auth::{
        middleware::{session_set_cookie, username_set_cookie},
        Auth, AuthError,
    },
    credentials::CredentialError,
    error::ApiError,
    models::{
        CurrentUserResponse, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
        UserResponse, Username,
    },
    state::IdentityState,
};

#[utoipa::path(
    post,
    path = "/chat/register",
    tag = "Identity",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Profile created", body = MessageResponse),
        (status = 400, description = "Invalid input or username taken")
    )
)]
pub async fn register(
    State(state): State<IdentityState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(request) = payload?;
    state
        .credentials
        .save_user(
            &request.bio,
            &request.password,
            &request.nickname,
            &request.username,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("You have successfully created a profile!")),
    ))
}

#[utoipa::path(
    post,
    path = "/chat/login",
    tag = "Identity",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued; auth_token and your_username cookies set", body = LoginResponse),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login(
    State(state): State<IdentityState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let token = state
        .credentials
        .login_user(&request.username, &request.password)
        .await
        .map_err(|e| match e {
            // Unknown user and wrong password look the same to the client.
            CredentialError::NotFound(_) | CredentialError::InvalidCredentials => {
                ApiError::unauthorized("invalid username or password")
            }
            other => other.into(),
        })?;

    let max_age = state.tokens.ttl().as_secs();
    let cookies = AppendHeaders([
        (SET_COOKIE, session_set_cookie(&token, max_age)),
        (SET_COOKIE, username_set_cookie(request.username.trim(), max_age)),
    ]);
    Ok((StatusCode::OK, cookies, Json(LoginResponse { token })))
}

#[utoipa::path(
    get,
    path = "/chat/{username}",
    tag = "Identity",
    params(("username" = String, Path, description = "Username including the leading @")),
    responses(
        (status = 200, description = "Public profile", body = UserResponse),
        (status = 400, description = "Invalid or unknown username"),
        (status = 401, description = "Missing or malformed session"),
        (status = 403, description = "Expired or forged session")
    )
)]
pub async fn get_user(
    State(state): State<IdentityState>,
    Auth(_session): Auth,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Path(raw) = path?;
    let username = Username::parse(&raw).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let user = state.credentials.get_user(&username)?;
    Ok(Json(UserResponse { user }))
}

/// Profile behind the caller's session.
///
/// The chat service uses this to learn who is acting; a token whose user
/// was deleted answers 401.
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Identity",
    responses(
        (status = 200, description = "Session user", body = CurrentUserResponse),
        (status = 401, description = "No session or session user no longer exists"),
        (status = 403, description = "Expired or forged session")
    )
)]
pub async fn current_user(
    State(state): State<IdentityState>,
    Auth(session): Auth,
) -> Result<Json<CurrentUserResponse>, ApiError> {
    let user = state
        .credentials
        .get_user_by_id(session.user_id)
        .map_err(|e| match e {
            CredentialError::NotFound(_) => ApiError::from(AuthError::UnknownSessionUser),
            other => other.into(),
        })?;

    Ok(Json(CurrentUserResponse {
        id: user.id,
        user: user.profile(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Session, TokenService};
    use crate::config::TokenConfig;
    use crate::storage::Store;
    use std::sync::Arc;
    use std::time::Duration;

    fn state() -> (tempfile::TempDir, IdentityState) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(&dir.path().join("identity.redb")).unwrap());
        let tokens = Arc::new(TokenService::new(
            &TokenConfig::new("users-secret", Duration::from_secs(3600)).unwrap(),
        ));
        (dir, IdentityState::new(store, tokens))
    }

    fn register_body(username: &str, password: &str, nickname: &str) -> Json<RegisterRequest> {
        Json(RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            nickname: nickname.to_string(),
            bio: "bio".to_string(),
        })
    }

    async fn register_user(state: &IdentityState, username: &str, password: &str, nickname: &str) {
        let (status, _) = register(
            State(state.clone()),
            Ok(register_body(username, password, nickname)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED, "{username:?}");
    }

    fn login_body(username: &str, password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    #[tokio::test]
    async fn register_returns_created() {
        let (_dir, state) = state();
        let (status, Json(body)) = register(State(state), Ok(register_body("@alice", "secret", "Al")))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.message, "You have successfully created a profile!");
    }

    #[tokio::test]
    async fn duplicate_registration_is_bad_request() {
        let (_dir, state) = state();
        register_user(&state, "@alice", "secret", "Al").await;
        let err = register(State(state), Ok(register_body("@alice", "other", "Other")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_sets_both_cookies() {
        let (_dir, state) = state();
        register_user(&state, "@alice", "secret", "Al").await;

        let response = login(State(state.clone()), Ok(login_body("@alice", "secret")))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let cookies: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("auth_token="));
        assert!(cookies[0].contains("HttpOnly"));
        assert!(cookies[0].contains("Max-Age=3600"));
        assert!(cookies[1].starts_with("your_username=@alice;"));
    }

    #[tokio::test]
    async fn every_registrable_username_can_log_in() {
        let (_dir, state) = state();
        let accepted = ["@alice", "@Ünïcödé", "@a.b-c_d", "@semi;colon", "@q\"uote", "@日本"];

        for username in accepted {
            register_user(&state, username, "secret", "Nick").await;
            let response = match login(State(state.clone()), Ok(login_body(username, "secret"))).await {
                Ok(response) => response.into_response(),
                Err(e) => panic!("{username:?} could not log in: {}", e.message),
            };
            assert_eq!(response.status(), StatusCode::OK, "{username:?}");
            assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 2);
        }
    }

    #[tokio::test]
    async fn control_characters_in_username_are_rejected() {
        let (_dir, state) = state();
        for username in ["@al\u{1}ice", "@x\u{1f}@y", "@del\u{7f}"] {
            let err = register(State(state.clone()), Ok(register_body(username, "secret", "Nick")))
                .await
                .unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST, "{username:?}");
        }
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_are_indistinguishable() {
        let (_dir, state) = state();
        register_user(&state, "@alice", "secret", "Al").await;

        let wrong = match login(State(state.clone()), Ok(login_body("@alice", "nope"))).await {
            Err(e) => e,
            Ok(_) => panic!("wrong password accepted"),
        };
        let unknown = match login(State(state), Ok(login_body("@ghost", "secret"))).await {
            Err(e) => e,
            Ok(_) => panic!("unknown user accepted"),
        };
        assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.message, unknown.message);
    }

    #[tokio::test]
    async fn get_user_returns_profile_without_hash() {
        let (_dir, state) = state();
        register_user(&state, "@alice", "secret", "Al").await;
        let session = Session {
            user_id: 1,
            token: String::new(),
        };

        let Json(body) = get_user(State(state), Auth(session), Ok(Path("@alice".to_string())))
            .await
            .unwrap();
        assert_eq!(body.user.nickname, "Al");
        assert_eq!(body.user.bio, "bio");
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("argon2"));
    }

    #[tokio::test]
    async fn get_user_rejects_unknown_and_malformed_names() {
        let (_dir, state) = state();
        let session = Session {
            user_id: 1,
            token: String::new(),
        };

        let unknown = get_user(
            State(state.clone()),
            Auth(session.clone()),
            Ok(Path("@ghost".to_string())),
        )
        .await
        .unwrap_err();
        assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

        let malformed = get_user(State(state), Auth(session), Ok(Path("alice".to_string())))
            .await
            .unwrap_err();
        assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn current_user_resolves_session() {
        let (_dir, state) = state();
        register_user(&state, "@alice", "secret", "Al").await;
        let session = Session {
            user_id: 1,
            token: String::new(),
        };

        let Json(body) = current_user(State(state), Auth(session)).await.unwrap();
        assert_eq!(body.id, 1);
        assert_eq!(body.user.username, "@alice");
    }

    #[tokio::test]
    async fn current_user_of_deleted_account_is_unauthorized() {
        let (_dir, state) = state();
        let session = Session {
            user_id: 42,
            token: String::new(),
        };

        let err = current_user(State(state), Auth(session)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
