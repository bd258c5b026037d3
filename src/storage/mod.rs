// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent storage in an embedded redb database. Each service owns one
//! database file under `DATA_DIR`.
//!
//! ## Storage Layout
//!
//! ```text
//! $DATA_DIR/
//!   identity.redb   # users, usernames (identity service)
//!   chat.redb       # chats, chat_keys, messages, chat_messages (chat service)
//! ```
//!
//! ## Important Notes
//!
//! - Every uniqueness check runs in the same write transaction as its insert
//! - Records are JSON-encoded values keyed by store-assigned `u64` ids
//! - Membership checks go through [`MembershipEnforcer`]

pub mod database;
pub mod membership;
pub mod repository;

pub use database::{StorageError, StorageResult, Store};
pub use membership::{MemberResource, MembershipEnforcer, ParticipantSet, ParticipantSetError};
pub use repository::{
    ChatRepository, MessageRepository, NewUser, StoredChat, StoredMessage, StoredUser,
    UserRepository,
};
