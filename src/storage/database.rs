// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded database backed by redb (pure Rust, ACID).
//!
//! Each service opens its own file; the identity service only touches the
//! user tables and the chat service only the chat and message tables.
//!
//! ## Table Layout
//!
//! - `users`: user id → serialized StoredUser
//! - `usernames`: username → user id (uniqueness index)
//! - `chats`: chat id → serialized StoredChat
//! - `chat_keys`: name + sorted participant set → chat id (uniqueness index)
//! - `messages`: message id → serialized StoredMessage
//! - `chat_messages`: composite key (chat_id_be | message_id_be) → message id
//! - `sequences`: table name → last assigned id
//!
//! redb allows a single write transaction at a time, so an index lookup and
//! the insert that follows it in the same transaction cannot interleave with
//! another writer.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, Table, TableDefinition};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: user id → serialized StoredUser (JSON bytes).
pub(crate) const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Index: username → user id.
pub(crate) const USERNAMES: TableDefinition<&str, u64> = TableDefinition::new("usernames");

/// Primary table: chat id → serialized StoredChat (JSON bytes).
pub(crate) const CHATS: TableDefinition<u64, &[u8]> = TableDefinition::new("chats");

/// Index: chat uniqueness key → chat id.
pub(crate) const CHAT_KEYS: TableDefinition<&str, u64> = TableDefinition::new("chat_keys");

/// Primary table: message id → serialized StoredMessage (JSON bytes).
pub(crate) const MESSAGES: TableDefinition<u64, &[u8]> = TableDefinition::new("messages");

/// Index: `chat_id_be | message_id_be` → message id, for ordered range scans.
pub(crate) const CHAT_MESSAGES: TableDefinition<&[u8], u64> = TableDefinition::new("chat_messages");

/// Id sequences: table name → last assigned id.
pub(crate) const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("permission denied: {user} cannot access {resource}")]
    PermissionDenied { user: String, resource: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Key Helpers
// =============================================================================

/// Build the composite `chat_messages` key.
///
/// Big-endian ids keep a chat's messages contiguous and in id order.
pub(crate) fn chat_message_key(chat_id: u64, message_id: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&chat_id.to_be_bytes());
    key[8..].copy_from_slice(&message_id.to_be_bytes());
    key
}

/// Allocate the next id of a sequence inside an open write transaction.
pub(crate) fn next_id(sequences: &mut Table<'_, &'static str, u64>, sequence: &str) -> StorageResult<u64> {
    let last = sequences.get(sequence)?.map(|v| v.value()).unwrap_or(0);
    let next = last + 1;
    sequences.insert(sequence, next)?;
    Ok(next)
}

// =============================================================================
// Store
// =============================================================================

/// Handle to one service's database file.
pub struct Store {
    db: Database,
}

impl Store {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERNAMES)?;
            let _ = write_txn.open_table(CHATS)?;
            let _ = write_txn.open_table(CHAT_KEYS)?;
            let _ = write_txn.open_table(MESSAGES)?;
            let _ = write_txn.open_table(CHAT_MESSAGES)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        tracing::debug!(path = %path.display(), "Opened database");
        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }

    /// Whether the database answers a read transaction.
    pub fn is_healthy(&self) -> bool {
        self.db
            .begin_read()
            .map(|txn| txn.open_table(SEQUENCES).is_ok())
            .unwrap_or(false)
    }
}

#[cfg(test)]
pub(crate) fn temp_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(&dir.path().join("test.redb")).expect("open store");
    (dir, store)
}
