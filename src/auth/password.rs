// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Argon2 password hashing.
//!
//! Every function here is CPU-heavy; async callers run them on the blocking
//! pool.

use std::sync::OnceLock;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::Rng;

/// Failures producing a password hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("could not encode salt: {0}")]
    Salt(String),

    #[error("could not hash password: {0}")]
    Hash(String),

    #[error("hashing task failed: {0}")]
    Worker(String),
}

/// Hash a password into a PHC string with a fresh 16-byte random salt.
pub fn hash(password: &str) -> Result<String, PasswordError> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Salt(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check a password against a stored PHC string.
///
/// An unparsable stored hash never verifies.
pub fn verify(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Run one full verification against a throwaway hash and return `false`.
///
/// Used when the account does not exist so that a login for an unknown
/// username costs the same as one with a wrong password.
pub fn verify_decoy(password: &str) -> bool {
    static DECOY: OnceLock<Option<String>> = OnceLock::new();

    if let Some(decoy) = DECOY.get_or_init(|| hash("decoy-credential").ok()) {
        let _ = verify(password, decoy);
    }
    false
}
