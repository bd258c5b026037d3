// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the database.
//!
//! Each repository provides the operations for one entity type and owns the
//! transactions that touch its tables.

pub mod chats;
pub mod messages;
pub mod users;

pub use chats::{ChatRepository, StoredChat};
pub use messages::{MessageRepository, StoredMessage};
pub use users::{NewUser, StoredUser, UserRepository};
