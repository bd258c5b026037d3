// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated sessions.
//!
//! Use the `Auth` extractor in handlers to require a session:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(session): Auth) -> impl IntoResponse {
//!     // session.user_id is the verified user id
//! }
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use super::{middleware::authenticate, AuthError, Session, TokenService};

/// Extractor for authenticated sessions.
///
/// Reuses the session attached by [`require_session`](super::middleware::require_session)
/// when the route is gated, and otherwise verifies the `auth_token` cookie itself.
pub struct Auth(pub Session);

impl<S> FromRequestParts<S> for Auth
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the session
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            return Ok(Auth(session));
        }

        let tokens = Arc::<TokenService>::from_ref(state);
        let session = authenticate(&parts.headers, &tokens)?;
        parts.extensions.insert(session.clone());
        Ok(Auth(session))
    }
}
