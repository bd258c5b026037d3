// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication gate for protected routes.
//!
//! The gate reads the `auth_token` cookie, verifies it and attaches the
//! resulting [`Session`] to the request extensions. It never loads the user
//! record.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/chat/make", post(make_chat))
//!     .route_layer(axum::middleware::from_fn_with_state(tokens.clone(), require_session));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::COOKIE, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthError, Session, TokenService};

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "auth_token";

/// Informational cookie with the logged-in username.
///
/// Set for clients at login. The servers never read it.
pub const USERNAME_COOKIE: &str = "your_username";

/// Find a cookie value by name across all `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
}

/// `Set-Cookie` value for the session token.
pub fn session_set_cookie(token: &str, max_age_secs: u64) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}")
}

/// `Set-Cookie` value for the informational username cookie.
pub fn username_set_cookie(username: &str, max_age_secs: u64) -> String {
    format!("{USERNAME_COOKIE}={username}; Path=/; SameSite=Lax; Max-Age={max_age_secs}")
}

/// Verify the session cookie on a request.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<Session, AuthError> {
    let token = cookie_value(headers, SESSION_COOKIE).ok_or(AuthError::MissingSessionCookie)?;
    let user_id = tokens.verify(token)?;
    Ok(Session {
        user_id,
        token: token.to_string(),
    })
}

/// Authentication middleware function.
pub async fn require_session(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(request.headers(), &tokens) {
        Ok(session) => {
            tracing::debug!(user_id = session.user_id, path = %request.uri().path(), "Session verified");
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
