// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential store of the identity service.
//!
//! Owns user records: registration with a salted argon2 hash, login that
//! issues a session token, and profile lookups. Hashing and verification run
//! on the blocking thread pool.

use std::sync::Arc;

use crate::auth::password::{self as hashing, PasswordError};
use crate::auth::{TokenError, TokenService};
use crate::models::{UserProfile, Username, UsernameError};
use crate::storage::{NewUser, StorageError, Store, StoredUser, UserRepository};

/// Credential store failures.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("username {0} is already taken")]
    UsernameTaken(String),

    #[error("user {0} not found")]
    NotFound(String),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Hashing(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for CredentialError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => CredentialError::NotFound(what),
            other => CredentialError::Storage(other),
        }
    }
}

impl From<UsernameError> for CredentialError {
    fn from(err: UsernameError) -> Self {
        CredentialError::InvalidInput(err.to_string())
    }
}

pub type CredentialResult<T> = Result<T, CredentialError>;

/// Registration and login against the user tables.
pub struct CredentialStore {
    store: Arc<Store>,
    tokens: Arc<TokenService>,
}

impl CredentialStore {
    pub fn new(store: Arc<Store>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.store)
    }

    /// Register a user and return its id.
    ///
    /// # Errors
    /// - `InvalidInput` for a bad username, empty password or blank nickname
    /// - `UsernameTaken` if the username is registered already
    pub async fn save_user(
        &self,
        bio: &str,
        password: &str,
        nickname: &str,
        username: &str,
    ) -> CredentialResult<u64> {
        let username = Username::parse(username)?;
        if password.is_empty() {
            return Err(CredentialError::InvalidInput("password must not be empty".into()));
        }
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(CredentialError::InvalidInput("nickname must not be empty".into()));
        }

        // Cheap early exit; the insert below re-checks inside its transaction.
        if self.users().exists(&username)? {
            return Err(CredentialError::UsernameTaken(username.to_string()));
        }

        let password = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hashing::hash(&password))
            .await
            .map_err(|e| PasswordError::Worker(e.to_string()))??;

        let stored = self
            .users()
            .create(NewUser {
                username: username.clone(),
                nickname: nickname.to_string(),
                bio: bio.to_string(),
                password_hash,
            })
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => CredentialError::UsernameTaken(username.to_string()),
                other => other.into(),
            })?;

        tracing::info!(user_id = stored.id, username = %stored.username, "User registered");
        Ok(stored.id)
    }

    /// Check a password and issue a session token.
    ///
    /// # Errors
    /// - `NotFound` if the username is unknown (or not a valid username)
    /// - `InvalidCredentials` if the password does not match
    pub async fn login_user(&self, username: &str, password: &str) -> CredentialResult<String> {
        let user = match Username::parse(username) {
            Ok(name) => match self.users().get_by_username(&name) {
                Ok(user) => Some(user),
                Err(StorageError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            },
            Err(_) => None,
        };

        // Unknown accounts still pay for one argon2 verification.
        let candidate = password.to_owned();
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let matches = tokio::task::spawn_blocking(move || match stored_hash {
            Some(stored) => hashing::verify(&candidate, &stored),
            None => hashing::verify_decoy(&candidate),
        })
        .await
        .map_err(|e| PasswordError::Worker(e.to_string()))?;

        let Some(user) = user else {
            tracing::warn!(username = %username, "Login rejected: unknown user");
            return Err(CredentialError::NotFound(username.to_string()));
        };
        if !matches {
            tracing::warn!(username = %user.username, "Login rejected: wrong password");
            return Err(CredentialError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(token)
    }

    /// Public profile (bio and nickname) of a user.
    pub fn get_user(&self, username: &Username) -> CredentialResult<UserProfile> {
        Ok(self.users().get_by_username(username)?.profile())
    }

    /// Nickname of a user.
    pub fn get_nickname_by_username(&self, username: &Username) -> CredentialResult<String> {
        Ok(self.users().get_by_username(username)?.nickname)
    }

    /// Resolve a verified session's user id to its record.
    pub fn get_user_by_id(&self, user_id: u64) -> CredentialResult<StoredUser> {
        Ok(self.users().get(user_id)?)
    }

    /// Remove a user. Existing tokens stay valid until they expire but no
    /// longer resolve to a profile.
    pub fn delete_user(&self, username: &Username) -> CredentialResult<()> {
        let removed = self.users().delete(username)?;
        tracing::info!(user_id = removed.id, username = %removed.username, "User deleted");
        Ok(())
    }
}
