// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Message repository.
//!
//! Messages are append-only. Each message is indexed under
//! `chat_id | message_id` so a chat's history is one ordered range scan.

use chrono::{DateTime, Utc};
use redb::ReadableDatabase;
use serde::{Deserialize, Serialize};

use crate::models::{MessageView, Username};

use super::super::database::{chat_message_key, next_id, CHAT_MESSAGES, MESSAGES, SEQUENCES};
use super::super::{StorageError, StorageResult, Store};

const MESSAGE_SEQUENCE: &str = "messages";

/// Message record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: u64,
    pub chat_id: u64,
    pub chat_name: String,
    pub sender: Username,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn view(&self) -> MessageView {
        MessageView {
            id: self.id,
            sender: self.sender.to_string(),
            text: self.text.clone(),
        }
    }
}

/// Repository for chat messages.
pub struct MessageRepository<'a> {
    store: &'a Store,
}

impl<'a> MessageRepository<'a> {
    /// Create a new MessageRepository.
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Append a message to a chat.
    ///
    /// Callers are responsible for checking that `sender` is a participant.
    pub fn append(
        &self,
        chat_id: u64,
        chat_name: &str,
        sender: &Username,
        text: &str,
    ) -> StorageResult<StoredMessage> {
        let write_txn = self.store.db().begin_write()?;
        let stored = {
            let mut sequences = write_txn.open_table(SEQUENCES)?;
            let id = next_id(&mut sequences, MESSAGE_SEQUENCE)?;

            let stored = StoredMessage {
                id,
                chat_id,
                chat_name: chat_name.to_string(),
                sender: sender.clone(),
                text: text.to_string(),
                created_at: Utc::now(),
            };
            let json = serde_json::to_vec(&stored)?;

            let mut messages = write_txn.open_table(MESSAGES)?;
            messages.insert(id, json.as_slice())?;

            let mut index = write_txn.open_table(CHAT_MESSAGES)?;
            let key = chat_message_key(chat_id, id);
            index.insert(key.as_slice(), id)?;
            stored
        };
        write_txn.commit()?;
        Ok(stored)
    }

    /// All messages of a chat in ascending id order.
    pub fn list_for_chat(&self, chat_id: u64) -> StorageResult<Vec<StoredMessage>> {
        let read_txn = self.store.db().begin_read()?;
        let index = read_txn.open_table(CHAT_MESSAGES)?;
        let messages = read_txn.open_table(MESSAGES)?;

        let start = chat_message_key(chat_id, 0);
        let end = chat_message_key(chat_id, u64::MAX);

        let mut results = Vec::new();
        for entry in index.range(start.as_slice()..=end.as_slice())? {
            let (_, message_id) = entry?;
            let message_id = message_id.value();
            let bytes = messages
                .get(message_id)?
                .map(|v| v.value().to_vec())
                .ok_or_else(|| StorageError::NotFound(format!("Message #{message_id}")))?;
            results.push(serde_json::from_slice(&bytes)?);
        }
        Ok(results)
    }

    /// Number of messages stored for a chat.
    pub fn count_for_chat(&self, chat_id: u64) -> StorageResult<usize> {
        Ok(self.list_for_chat(chat_id)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::temp_store;

    fn user(raw: &str) -> Username {
        Username::parse(raw).unwrap()
    }

    #[test]
    fn messages_are_listed_per_chat_in_order() {
        let (_dir, store) = temp_store();
        let repo = MessageRepository::new(&store);

        repo.append(1, "Trip", &user("@alice"), "first").unwrap();
        repo.append(2, "Other", &user("@carol"), "elsewhere").unwrap();
        repo.append(1, "Trip", &user("@bob"), "second").unwrap();

        let trip = repo.list_for_chat(1).unwrap();
        let texts: Vec<_> = trip.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert!(trip[0].id < trip[1].id);
        assert_eq!(trip[1].view().sender, "@bob");

        assert_eq!(repo.count_for_chat(2).unwrap(), 1);
        assert!(repo.list_for_chat(3).unwrap().is_empty());
    }

    #[test]
    fn message_ids_are_global_and_monotonic() {
        let (_dir, store) = temp_store();
        let repo = MessageRepository::new(&store);

        let a = repo.append(5, "x", &user("@a"), "1").unwrap();
        let b = repo.append(6, "y", &user("@b"), "2").unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }
}
