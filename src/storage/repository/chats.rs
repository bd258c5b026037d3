// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chat repository.
//!
//! Chats are immutable once created. A chat is unique by its exact name plus
//! its participant set in any order.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};

use crate::models::Username;

use super::super::database::{next_id, CHATS, CHAT_KEYS, SEQUENCES};
use super::super::membership::{join, MemberResource, ParticipantSet};
use super::super::{StorageError, StorageResult, Store};

const CHAT_SEQUENCE: &str = "chats";

/// Chat record as persisted by the chat service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredChat {
    pub id: u64,
    pub name: String,
    /// Participants in the order they were declared
    pub participants: Vec<Username>,
    pub number_of_participants: usize,
    pub created_at: DateTime<Utc>,
}

impl StoredChat {
    /// Participant usernames joined by `", "`.
    pub fn participants_display(&self) -> String {
        join(self.participants.iter().map(Username::as_str))
    }
}

impl MemberResource for StoredChat {
    fn participants(&self) -> &[Username] {
        &self.participants
    }

    fn describe(&self) -> String {
        format!("chat {} #{}", self.name, self.id)
    }
}

/// Repository for chat records.
pub struct ChatRepository<'a> {
    store: &'a Store,
}

impl<'a> ChatRepository<'a> {
    /// Create a new ChatRepository.
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Create a chat.
    ///
    /// # Errors
    /// `StorageError::AlreadyExists` if a chat with the same name and the same
    /// participant set already exists.
    pub fn create(&self, name: &str, participants: &ParticipantSet) -> StorageResult<StoredChat> {
        let key = participants.chat_key(name);

        let write_txn = self.store.db().begin_write()?;
        let stored = {
            let mut keys = write_txn.open_table(CHAT_KEYS)?;
            if keys.get(key.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "Chat {name} with participants {}",
                    participants.canonical()
                )));
            }

            let mut sequences = write_txn.open_table(SEQUENCES)?;
            let id = next_id(&mut sequences, CHAT_SEQUENCE)?;

            let stored = StoredChat {
                id,
                name: name.to_string(),
                participants: participants.as_slice().to_vec(),
                number_of_participants: participants.len(),
                created_at: Utc::now(),
            };
            let json = serde_json::to_vec(&stored)?;

            let mut chats = write_txn.open_table(CHATS)?;
            chats.insert(id, json.as_slice())?;
            keys.insert(key.as_str(), id)?;
            stored
        };
        write_txn.commit()?;
        Ok(stored)
    }

    /// Get a chat by id.
    pub fn get(&self, id: u64) -> StorageResult<StoredChat> {
        let read_txn = self.store.db().begin_read()?;
        let chats = read_txn.open_table(CHATS)?;
        let bytes = chats
            .get(id)?
            .map(|v| v.value().to_vec())
            .ok_or_else(|| StorageError::NotFound(format!("Chat #{id}")))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Get a chat by id, requiring its name to match.
    ///
    /// A name mismatch is reported exactly like a missing chat.
    pub fn find(&self, name: &str, id: u64) -> StorageResult<StoredChat> {
        match self.get(id) {
            Ok(chat) if chat.name == name => Ok(chat),
            Ok(_) | Err(StorageError::NotFound(_)) => {
                Err(StorageError::NotFound(format!("Chat {name} #{id}")))
            }
            Err(e) => Err(e),
        }
    }

    /// Number of stored chats.
    pub fn count(&self) -> StorageResult<u64> {
        let read_txn = self.store.db().begin_read()?;
        let chats = read_txn.open_table(CHATS)?;
        Ok(chats.iter()?.count() as u64)
    }
}
