// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token issuing and verification (HS256).
//!
//! Tokens are stateless: nothing is stored server-side and a token stays
//! valid until its `exp` passes. Verification does not check that the user
//! still exists.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use super::claims::SessionClaims;
use crate::config::TokenConfig;

/// Token verification and signing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Not three non-empty base64url segments (including segments that do not
    /// decode), or a subject that is not a user id.
    #[error("session token is malformed")]
    Malformed,

    /// Signature is valid but the token is past its expiry.
    #[error("session token has expired")]
    Expired,

    /// The token was not produced by this secret, or was altered.
    #[error("session token signature is invalid")]
    InvalidSignature,

    #[error("failed to sign session token: {0}")]
    Signing(String),
}

/// Issues and verifies session tokens with the process-wide secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(&config.secret),
            decoding: DecodingKey::from_secret(&config.secret),
            validation,
            ttl: config.ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id`, valid for the configured TTL from now.
    pub fn issue(&self, user_id: u64) -> Result<String, TokenError> {
        self.issue_at(user_id, unix_now())
    }

    /// Issue a token as if it had been created at `issued_at` (Unix seconds).
    pub(crate) fn issue_at(&self, user_id: u64, issued_at: u64) -> Result<String, TokenError> {
        let claims = SessionClaims::new(user_id, issued_at, self.ttl.as_secs());
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<u64, TokenError> {
        if !is_well_formed(token) {
            return Err(TokenError::Malformed);
        }

        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::Base64(_) => TokenError::Malformed,
                _ => TokenError::InvalidSignature,
            },
        )?;

        data.claims.sub.parse::<u64>().map_err(|_| TokenError::Malformed)
    }
}

/// Three non-empty segments of base64url characters separated by dots.
fn is_well_formed(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    segments.len() == 3
        && segments.iter().all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        })
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
