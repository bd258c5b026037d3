// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token claims and the authenticated session representation.

use serde::{Deserialize, Serialize};

/// Claims carried inside a session token.
///
/// The subject is the decimal user id assigned by the identity service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject (user id, decimal)
    pub sub: String,

    /// Issued at, seconds since the Unix epoch
    pub iat: u64,

    /// Expiration, seconds since the Unix epoch
    pub exp: u64,
}

impl SessionClaims {
    pub fn new(user_id: u64, issued_at: u64, ttl_secs: u64) -> Self {
        Self {
            sub: user_id.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
        }
    }
}

/// A verified session attached to a request by the authentication gate.
///
/// Only the user id is trusted. The raw token is kept so the chat service can
/// forward it when it calls the identity service on the caller's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: u64,
    pub token: String,
}
