// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The chat service's view of the identity service.
//!
//! The identity service is the single source of truth for whether a user
//! exists. Every lookup forwards the caller's session token as the
//! `auth_token` cookie because the identity routes are gated.
//!
//! ## Usage
//!
//! Build an [`HttpIdentityClient`] from `IDENTITY_URL` at startup and hand it
//! to the chat service as an `Arc<dyn IdentityDirectory>`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header::COOKIE, StatusCode};
use tokio::{sync::Semaphore, task::JoinSet};
use url::Url;

use crate::auth::SESSION_COOKIE;
use crate::config::IdentityClientConfig;
use crate::models::{CurrentUserResponse, UserProfile, UserResponse, Username};

/// Failures talking to the identity service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    #[error("identity service unreachable: {0}")]
    Transport(String),

    #[error("identity service returned {status} for {path}")]
    UnexpectedStatus { status: u16, path: String },

    #[error("identity service response could not be decoded: {0}")]
    Decode(String),

    #[error("identity service did not answer in time")]
    Timeout,
}

/// Lookups the chat service needs from the identity service.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Profile of `username`, or `None` if the identity service does not
    /// confirm that the user exists.
    async fn lookup(
        &self,
        username: &Username,
        token: &str,
    ) -> Result<Option<UserProfile>, DirectoryError>;

    /// Profile of the user the session token was issued to, or `None` if
    /// that user no longer exists.
    async fn whoami(&self, token: &str) -> Result<Option<UserProfile>, DirectoryError>;
}

// =============================================================================
// HTTP client
// =============================================================================

/// [`IdentityDirectory`] backed by the identity service's HTTP API.
#[derive(Clone)]
pub struct HttpIdentityClient {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpIdentityClient {
    pub fn new(config: &IdentityClientConfig) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, escaping each one.
    fn url_for(&self, segments: &[&str]) -> Result<Url, DirectoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DirectoryError::Transport(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url, token: &str) -> Result<reqwest::Response, DirectoryError> {
        self.client
            .get(url)
            .header(COOKIE, format!("{SESSION_COOKIE}={token}"))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DirectoryError::Timeout
                } else {
                    DirectoryError::Transport(e.to_string())
                }
            })
    }
}

#[async_trait]
impl IdentityDirectory for HttpIdentityClient {
    async fn lookup(
        &self,
        username: &Username,
        token: &str,
    ) -> Result<Option<UserProfile>, DirectoryError> {
        let url = self.url_for(&["chat", username.as_str()])?;
        let response = self.get(url, token).await?;

        if !response.status().is_success() {
            tracing::debug!(
                username = %username,
                status = response.status().as_u16(),
                "Identity service did not confirm user"
            );
            return Ok(None);
        }

        let body: UserResponse = response
            .json()
            .await
            .map_err(|e| DirectoryError::Decode(e.to_string()))?;
        Ok(Some(body.user))
    }

    async fn whoami(&self, token: &str) -> Result<Option<UserProfile>, DirectoryError> {
        let url = self.url_for(&["users", "me"])?;
        let response = self.get(url, token).await?;

        match response.status() {
            status if status.is_success() => {
                let body: CurrentUserResponse = response
                    .json()
                    .await
                    .map_err(|e| DirectoryError::Decode(e.to_string()))?;
                Ok(Some(body.user))
            }
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => Ok(None),
            status => Err(DirectoryError::UnexpectedStatus {
                status: status.as_u16(),
                path: "/users/me".to_string(),
            }),
        }
    }
}

// =============================================================================
// Batched lookups
// =============================================================================

/// Concurrency and time budget for a batch of lookups.
#[derive(Debug, Clone, Copy)]
pub struct LookupLimits {
    pub concurrency: usize,
    pub timeout: std::time::Duration,
}

impl From<&IdentityClientConfig> for LookupLimits {
    fn from(config: &IdentityClientConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            timeout: config.timeout,
        }
    }
}

/// Look up every username with at most `limits.concurrency` requests in
/// flight and one overall deadline.
///
/// Results come back in input order. The first transport failure aborts the
/// batch; remaining lookups are cancelled when the `JoinSet` is dropped.
pub async fn lookup_all(
    directory: Arc<dyn IdentityDirectory>,
    usernames: &[Username],
    token: &str,
    limits: LookupLimits,
) -> Result<Vec<(Username, Option<UserProfile>)>, DirectoryError> {
    let semaphore = Arc::new(Semaphore::new(limits.concurrency.max(1)));
    let mut set: JoinSet<Result<(usize, Option<UserProfile>), DirectoryError>> = JoinSet::new();

    for (index, username) in usernames.iter().cloned().enumerate() {
        let directory = Arc::clone(&directory);
        let semaphore = Arc::clone(&semaphore);
        let token = token.to_string();
        set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| DirectoryError::Transport(e.to_string()))?;
            let profile = directory.lookup(&username, &token).await?;
            Ok((index, profile))
        });
    }

    let collect = async {
        let mut found: Vec<Option<UserProfile>> = vec![None; usernames.len()];
        while let Some(joined) = set.join_next().await {
            let (index, profile) = joined.map_err(|e| DirectoryError::Transport(e.to_string()))??;
            found[index] = profile;
        }
        Ok::<_, DirectoryError>(found)
    };

    let found = tokio::time::timeout(limits.timeout, collect)
        .await
        .map_err(|_| DirectoryError::Timeout)??;

    Ok(usernames.iter().cloned().zip(found).collect())
}
