// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::TokenService;
use crate::chats::{ChatService, HttpIdentityClient, LookupLimits};
use crate::config::{ChatConfig, IdentityConfig};
use crate::credentials::CredentialStore;
use crate::storage::{StorageResult, Store};

/// Shared state of the identity service.
#[derive(Clone)]
pub struct IdentityState {
    pub store: Arc<Store>,
    pub credentials: Arc<CredentialStore>,
    pub tokens: Arc<TokenService>,
}

impl IdentityState {
    pub fn new(store: Arc<Store>, tokens: Arc<TokenService>) -> Self {
        Self {
            credentials: Arc::new(CredentialStore::new(Arc::clone(&store), Arc::clone(&tokens))),
            store,
            tokens,
        }
    }

    /// Open the identity database and build the state from configuration.
    pub fn from_config(config: &IdentityConfig) -> StorageResult<Self> {
        let store = Arc::new(Store::open(&config.database_path())?);
        let tokens = Arc::new(TokenService::new(&config.token));
        Ok(Self::new(store, tokens))
    }
}

impl FromRef<IdentityState> for Arc<TokenService> {
    fn from_ref(state: &IdentityState) -> Self {
        Arc::clone(&state.tokens)
    }
}

/// Shared state of the chat service.
#[derive(Clone)]
pub struct ChatState {
    pub chats: Arc<ChatService>,
    pub tokens: Arc<TokenService>,
}

impl ChatState {
    pub fn new(chats: Arc<ChatService>, tokens: Arc<TokenService>) -> Self {
        Self { chats, tokens }
    }

    /// Open the chat database, build the identity client and the state.
    pub fn from_config(config: &ChatConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let store = Arc::new(Store::open(&config.database_path())?);
        let directory = Arc::new(HttpIdentityClient::new(&config.identity)?);
        let chats = ChatService::new(store, directory, LookupLimits::from(&config.identity));
        let tokens = Arc::new(TokenService::new(&config.token));
        Ok(Self::new(Arc::new(chats), tokens))
    }
}

impl FromRef<ChatState> for Arc<TokenService> {
    fn from_ref(state: &ChatState) -> Self {
        Arc::clone(&state.tokens)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::chats::directory::tests::FakeDirectory;
    use crate::config::TokenConfig;
    use std::time::Duration;

    /// Chat state over a temporary database and an in-memory directory.
    pub(crate) fn chat_state(directory: FakeDirectory) -> (tempfile::TempDir, ChatState) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(&dir.path().join("chat.redb")).unwrap());
        let chats = ChatService::new(
            store,
            Arc::new(directory),
            LookupLimits {
                concurrency: 4,
                timeout: Duration::from_secs(2),
            },
        );
        let tokens = Arc::new(TokenService::new(
            &TokenConfig::new("chat-state-secret", Duration::from_secs(600)).unwrap(),
        ));
        (dir, ChatState::new(Arc::new(chats), tokens))
    }

    #[test]
    fn identity_state_shares_token_service() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(&dir.path().join("identity.redb")).unwrap());
        let tokens = Arc::new(TokenService::new(
            &TokenConfig::new("state-secret", Duration::from_secs(60)).unwrap(),
        ));
        let state = IdentityState::new(store, Arc::clone(&tokens));

        let extracted = Arc::<TokenService>::from_ref(&state);
        assert!(Arc::ptr_eq(&extracted, &tokens));
    }
}
