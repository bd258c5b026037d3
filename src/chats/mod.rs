// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Chat Authorization
//!
//! Chat creation, chat reads and message writes for the chat service.
//!
//! ## Rules
//!
//! - Every participant named at creation must be confirmed by the identity
//!   service before anything is stored; one unknown name fails the request
//! - The caller's username is resolved from the verified session through the
//!   identity service, never from a client-supplied value
//! - Reads and writes require exact-token membership in the chat

pub mod directory;

use std::sync::Arc;

use crate::auth::Session;
use crate::models::{ChatView, Username};
use crate::storage::{
    membership::join, ChatRepository, MembershipEnforcer, MessageRepository, ParticipantSet,
    ParticipantSetError, StorageError, Store, StoredChat, StoredMessage,
};

pub use directory::{
    lookup_all, DirectoryError, HttpIdentityClient, IdentityDirectory, LookupLimits,
};

/// Chat operation failures.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("at least one participant is required")]
    NoParticipants,

    #[error("there are some non-existing users: {}", .0.join(", "))]
    UnknownParticipant(Vec<String>),

    #[error("a chat with this name and these participants already exists")]
    ChatAlreadyExists,

    #[error("chat {name} #{id} not found")]
    ChatNotFound { name: String, id: u64 },

    #[error("you are not a participant of this chat")]
    Forbidden,

    #[error("session user could not be resolved")]
    Unauthorized,

    #[error("identity service unavailable: {0}")]
    IdentityUnavailable(#[from] DirectoryError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ParticipantSetError> for ChatError {
    fn from(err: ParticipantSetError) -> Self {
        match err {
            ParticipantSetError::Empty => ChatError::NoParticipants,
            ParticipantSetError::Invalid(names) => ChatError::UnknownParticipant(names),
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

/// Chat service operations backed by the chat database and the identity
/// directory.
pub struct ChatService {
    store: Arc<Store>,
    directory: Arc<dyn IdentityDirectory>,
    limits: LookupLimits,
}

impl ChatService {
    pub fn new(store: Arc<Store>, directory: Arc<dyn IdentityDirectory>, limits: LookupLimits) -> Self {
        Self {
            store,
            directory,
            limits,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Create a chat after confirming every participant exists.
    ///
    /// # Errors
    /// - `Validation` for a blank name
    /// - `NoParticipants` when the list is empty after normalization
    /// - `UnknownParticipant` naming every participant that failed
    /// - `ChatAlreadyExists` for a repeated name and participant set
    /// - `IdentityUnavailable` on transport failure or timeout
    pub async fn create_chat(
        &self,
        session: &Session,
        name: &str,
        raw_participants: &str,
    ) -> ChatResult<StoredChat> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatError::Validation("chat name must not be empty".into()));
        }
        let participants = ParticipantSet::parse(raw_participants)?;

        let found = lookup_all(
            Arc::clone(&self.directory),
            participants.as_slice(),
            &session.token,
            self.limits,
        )
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Participant validation failed"))?;

        let unknown: Vec<String> = found
            .into_iter()
            .filter(|(_, profile)| profile.is_none())
            .map(|(username, _)| username.to_string())
            .collect();
        if !unknown.is_empty() {
            tracing::info!(chat = %name, unknown = ?unknown, "Rejected chat with unknown participants");
            return Err(ChatError::UnknownParticipant(unknown));
        }

        let chat = ChatRepository::new(&self.store)
            .create(name, &participants)
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => ChatError::ChatAlreadyExists,
                other => other.into(),
            })?;

        tracing::info!(
            chat_id = chat.id,
            chat = %chat.name,
            creator = session.user_id,
            participants = chat.number_of_participants,
            "Chat created"
        );
        Ok(chat)
    }

    /// Chat contents for a participant.
    ///
    /// Participant nicknames come from the identity service; a participant
    /// without a resolvable profile is shown by username.
    pub async fn read_chat(&self, session: &Session, name: &str, id: u64) -> ChatResult<ChatView> {
        let chat = self.find_chat(name, id)?;
        let caller = self.resolve_caller(session).await?;
        self.authorize(&chat, &caller)?;

        let messages = MessageRepository::new(&self.store).list_for_chat(chat.id)?;

        let profiles = lookup_all(
            Arc::clone(&self.directory),
            &chat.participants,
            &session.token,
            self.limits,
        )
        .await?;
        let nicknames: Vec<String> = profiles
            .into_iter()
            .map(|(username, profile)| match profile {
                Some(profile) => profile.nickname,
                None => {
                    tracing::warn!(chat_id = chat.id, username = %username, "Participant profile unavailable");
                    username.to_string()
                }
            })
            .collect();

        Ok(ChatView {
            name: chat.name,
            participants: join(nicknames.iter().map(String::as_str)),
            messages: messages.iter().map(StoredMessage::view).collect(),
        })
    }

    /// Append a message as the session user.
    pub async fn write_message(
        &self,
        session: &Session,
        chat_name: &str,
        id: u64,
        text: &str,
    ) -> ChatResult<StoredMessage> {
        if text.trim().is_empty() {
            return Err(ChatError::Validation("message text must not be empty".into()));
        }

        let chat = self.find_chat(chat_name, id)?;
        let sender = self.resolve_caller(session).await?;
        self.authorize(&chat, &sender)?;

        let message = MessageRepository::new(&self.store).append(chat.id, &chat.name, &sender, text)?;
        tracing::info!(chat_id = chat.id, message_id = message.id, sender = %sender, "Message written");
        Ok(message)
    }

    fn find_chat(&self, name: &str, id: u64) -> ChatResult<StoredChat> {
        ChatRepository::new(&self.store)
            .find(name, id)
            .map_err(|e| match e {
                StorageError::NotFound(_) => ChatError::ChatNotFound {
                    name: name.to_string(),
                    id,
                },
                other => other.into(),
            })
    }

    fn authorize(&self, chat: &StoredChat, caller: &Username) -> ChatResult<()> {
        chat.verify_member(caller).map_err(|e| match e {
            StorageError::PermissionDenied { user, resource } => {
                tracing::info!(user = %user, resource = %resource, "Membership check failed");
                ChatError::Forbidden
            }
            other => other.into(),
        })
    }

    /// Username of the session user, as known to the identity service.
    async fn resolve_caller(&self, session: &Session) -> ChatResult<Username> {
        let profile = self
            .directory
            .whoami(&session.token)
            .await?
            .ok_or(ChatError::Unauthorized)?;
        Username::parse(&profile.username).map_err(|_| ChatError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::directory::tests::FakeDirectory;
    use super::*;
    use crate::storage::database::temp_store;
    use std::time::Duration;

    const ALICE_TOKEN: &str = "token-alice";
    const BOB_TOKEN: &str = "token-bob";
    const CAROL_TOKEN: &str = "token-carol";

    fn session(token: &str) -> Session {
        Session {
            user_id: 1,
            token: token.to_string(),
        }
    }

    fn directory() -> FakeDirectory {
        FakeDirectory::default()
            .with_user("@alice", "Al")
            .with_user("@bob", "Bo")
            .with_user("@carol", "Cy")
            .with_session(ALICE_TOKEN, "@alice")
            .with_session(BOB_TOKEN, "@bob")
            .with_session(CAROL_TOKEN, "@carol")
    }

    fn service_with(directory: FakeDirectory) -> (tempfile::TempDir, ChatService) {
        let (dir, store) = temp_store();
        let service = ChatService::new(
            Arc::new(store),
            Arc::new(directory),
            LookupLimits {
                concurrency: 4,
                timeout: Duration::from_secs(2),
            },
        );
        (dir, service)
    }

    fn service() -> (tempfile::TempDir, ChatService) {
        service_with(directory())
    }

    fn chat_count(service: &ChatService) -> u64 {
        ChatRepository::new(service.store()).count().unwrap()
    }

    #[tokio::test]
    async fn create_then_read_by_every_participant() {
        let (_dir, chats) = service();
        let chat = chats
            .create_chat(&session(ALICE_TOKEN), "Trip", "@alice, @bob")
            .await
            .unwrap();
        assert_eq!(chat.id, 1);

        for token in [ALICE_TOKEN, BOB_TOKEN] {
            let view = chats.read_chat(&session(token), "Trip", 1).await.unwrap();
            assert_eq!(view.name, "Trip");
            assert_eq!(view.participants, "Al, Bo");
            assert!(view.messages.is_empty());
        }
    }

    #[tokio::test]
    async fn non_participant_is_forbidden() {
        let (_dir, chats) = service();
        chats
            .create_chat(&session(ALICE_TOKEN), "Trip", "@alice, @bob")
            .await
            .unwrap();

        let err = chats.read_chat(&session(CAROL_TOKEN), "Trip", 1).await.unwrap_err();
        assert!(matches!(err, ChatError::Forbidden));
    }

    #[tokio::test]
    async fn unknown_participant_leaves_no_chat() {
        let (_dir, chats) = service();
        let err = chats
            .create_chat(&session(ALICE_TOKEN), "Trip", "@alice, @ghost, @nobody")
            .await
            .unwrap_err();

        match err {
            ChatError::UnknownParticipant(names) => assert_eq!(names, vec!["@ghost", "@nobody"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(chat_count(&chats), 0);
    }

    #[tokio::test]
    async fn malformed_participant_is_reported_as_unknown() {
        let (_dir, chats) = service();
        let err = chats
            .create_chat(&session(ALICE_TOKEN), "Trip", "@alice, bob")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::UnknownParticipant(ref names) if names == &["bob"]));
    }

    #[tokio::test]
    async fn empty_participant_list_is_rejected() {
        let (_dir, chats) = service();
        let err = chats
            .create_chat(&session(ALICE_TOKEN), "Trip", " , ")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NoParticipants));
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let (_dir, chats) = service();
        let err = chats
            .create_chat(&session(ALICE_TOKEN), "   ", "@alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_chat_is_rejected() {
        let (_dir, chats) = service();
        chats
            .create_chat(&session(ALICE_TOKEN), "Trip", "@alice, @bob")
            .await
            .unwrap();
        let err = chats
            .create_chat(&session(BOB_TOKEN), "Trip", "@bob,@alice,@bob")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ChatAlreadyExists));
    }

    #[tokio::test]
    async fn identity_outage_is_unavailable_and_stores_nothing() {
        let (_dir, chats) = service_with(FakeDirectory {
            fail: true,
            ..directory()
        });
        let err = chats
            .create_chat(&session(ALICE_TOKEN), "Trip", "@alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::IdentityUnavailable(_)));
        assert_eq!(chat_count(&chats), 0);
    }

    #[tokio::test]
    async fn write_then_read_shows_message() {
        let (_dir, chats) = service();
        chats
            .create_chat(&session(ALICE_TOKEN), "Trip", "@alice, @bob")
            .await
            .unwrap();

        let message = chats
            .write_message(&session(ALICE_TOKEN), "Trip", 1, "hi")
            .await
            .unwrap();
        assert_eq!(message.sender.as_str(), "@alice");

        let view = chats.read_chat(&session(BOB_TOKEN), "Trip", 1).await.unwrap();
        assert_eq!(view.messages.len(), 1);
        assert_eq!(view.messages[0].sender, "@alice");
        assert_eq!(view.messages[0].text, "hi");
    }

    #[tokio::test]
    async fn non_participant_write_appends_nothing() {
        let (_dir, chats) = service();
        chats
            .create_chat(&session(ALICE_TOKEN), "Trip", "@alice, @bob")
            .await
            .unwrap();

        let err = chats
            .write_message(&session(CAROL_TOKEN), "Trip", 1, "let me in")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Forbidden));
        assert_eq!(
            MessageRepository::new(chats.store()).count_for_chat(1).unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn prefix_of_member_name_is_not_a_member() {
        let directory = directory().with_user("@al", "Imposter").with_session("token-al", "@al");
        let (_dir, chats) = service_with(directory);
        chats
            .create_chat(&session(ALICE_TOKEN), "Trip", "@alice, @bob")
            .await
            .unwrap();

        let err = chats.read_chat(&session("token-al"), "Trip", 1).await.unwrap_err();
        assert!(matches!(err, ChatError::Forbidden));
    }

    #[tokio::test]
    async fn wrong_name_or_id_is_not_found() {
        let (_dir, chats) = service();
        chats
            .create_chat(&session(ALICE_TOKEN), "Trip", "@alice")
            .await
            .unwrap();

        assert!(matches!(
            chats.read_chat(&session(ALICE_TOKEN), "Other", 1).await,
            Err(ChatError::ChatNotFound { .. })
        ));
        assert!(matches!(
            chats.write_message(&session(ALICE_TOKEN), "Trip", 9, "x").await,
            Err(ChatError::ChatNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn unresolvable_session_user_is_unauthorized() {
        let (_dir, chats) = service();
        chats
            .create_chat(&session(ALICE_TOKEN), "Trip", "@alice")
            .await
            .unwrap();

        let err = chats
            .read_chat(&session("token-of-deleted-user"), "Trip", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Unauthorized));
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let (_dir, chats) = service();
        let err = chats
            .write_message(&session(ALICE_TOKEN), "Trip", 1, "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_profile_falls_back_to_username() {
        let (_dir, chats) = service();
        chats
            .create_chat(&session(ALICE_TOKEN), "Trip", "@alice, @bob")
            .await
            .unwrap();

        // Same store, directory that has since lost @bob.
        let mut lossy = directory();
        lossy.users.remove("@bob");
        let chats = ChatService::new(
            Arc::clone(&chats.store),
            Arc::new(lossy),
            chats.limits,
        );

        let view = chats.read_chat(&session(ALICE_TOKEN), "Trip", 1).await.unwrap();
        assert_eq!(view.participants, "Al, @bob");
    }
}
