// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Users are stored as JSON under their numeric id with a separate
//! username → id index that enforces uniqueness.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};

use crate::models::{UserProfile, Username};

use super::super::database::{next_id, SEQUENCES, USERNAMES, USERS};
use super::super::{StorageError, StorageResult, Store};

const USER_SEQUENCE: &str = "users";

/// User record as persisted by the identity service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Store-assigned, monotonic identifier
    pub id: u64,
    pub username: Username,
    pub nickname: String,
    pub bio: String,
    /// Argon2 PHC string. Never leaves the identity service.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl StoredUser {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.to_string(),
            nickname: self.nickname.clone(),
            bio: self.bio.clone(),
        }
    }
}

/// Fields of a user that does not have an id yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub nickname: String,
    pub bio: String,
    pub password_hash: String,
}

/// Repository for user records.
pub struct UserRepository<'a> {
    store: &'a Store,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository.
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Insert a user, assigning the next id.
    ///
    /// The username check and the insert share one write transaction.
    ///
    /// # Errors
    /// `StorageError::AlreadyExists` if the username is taken.
    pub fn create(&self, user: NewUser) -> StorageResult<StoredUser> {
        let write_txn = self.store.db().begin_write()?;
        let stored = {
            let mut index = write_txn.open_table(USERNAMES)?;
            if index.get(user.username.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!("User {}", user.username)));
            }

            let mut sequences = write_txn.open_table(SEQUENCES)?;
            let id = next_id(&mut sequences, USER_SEQUENCE)?;

            let stored = StoredUser {
                id,
                username: user.username,
                nickname: user.nickname,
                bio: user.bio,
                password_hash: user.password_hash,
                created_at: Utc::now(),
            };
            let json = serde_json::to_vec(&stored)?;

            let mut users = write_txn.open_table(USERS)?;
            users.insert(id, json.as_slice())?;
            index.insert(stored.username.as_str(), id)?;
            stored
        };
        write_txn.commit()?;
        Ok(stored)
    }

    /// Get a user by id.
    pub fn get(&self, id: u64) -> StorageResult<StoredUser> {
        let read_txn = self.store.db().begin_read()?;
        let users = read_txn.open_table(USERS)?;
        match users.get(id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StorageError::NotFound(format!("User #{id}"))),
        }
    }

    /// Get a user by username.
    pub fn get_by_username(&self, username: &Username) -> StorageResult<StoredUser> {
        let read_txn = self.store.db().begin_read()?;
        let index = read_txn.open_table(USERNAMES)?;
        let id = index
            .get(username.as_str())?
            .map(|v| v.value())
            .ok_or_else(|| StorageError::NotFound(format!("User {username}")))?;

        let users = read_txn.open_table(USERS)?;
        match users.get(id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StorageError::NotFound(format!("User {username}"))),
        }
    }

    /// Check if a username is registered.
    pub fn exists(&self, username: &Username) -> StorageResult<bool> {
        let read_txn = self.store.db().begin_read()?;
        let index = read_txn.open_table(USERNAMES)?;
        Ok(index.get(username.as_str())?.is_some())
    }

    /// Delete a user and its index entry.
    pub fn delete(&self, username: &Username) -> StorageResult<StoredUser> {
        let write_txn = self.store.db().begin_write()?;
        let removed = {
            let mut index = write_txn.open_table(USERNAMES)?;
            let id = index
                .remove(username.as_str())?
                .map(|v| v.value())
                .ok_or_else(|| StorageError::NotFound(format!("User {username}")))?;

            let mut users = write_txn.open_table(USERS)?;
            let bytes = users
                .remove(id)?
                .map(|v| v.value().to_vec())
                .ok_or_else(|| StorageError::NotFound(format!("User #{id}")))?;
            serde_json::from_slice::<StoredUser>(&bytes)?
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Number of registered users.
    pub fn count(&self) -> StorageResult<u64> {
        let read_txn = self.store.db().begin_read()?;
        let users = read_txn.open_table(USERS)?;
        Ok(users.iter()?.count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::temp_store;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: Username::parse(name).unwrap(),
            nickname: format!("nick {name}"),
            bio: "bio".to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[test]
    fn create_assigns_monotonic_ids() {
        let (_dir, store) = temp_store();
        let repo = UserRepository::new(&store);

        let a = repo.create(new_user("@alice")).unwrap();
        let b = repo.create(new_user("@bob")).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn duplicate_username_is_rejected_without_side_effects() {
        let (_dir, store) = temp_store();
        let repo = UserRepository::new(&store);

        repo.create(new_user("@alice")).unwrap();
        let mut again = new_user("@alice");
        again.nickname = "someone else".to_string();
        let err = repo.create(again).unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));

        assert_eq!(repo.count().unwrap(), 1);
        let stored = repo.get_by_username(&Username::parse("@alice").unwrap()).unwrap();
        assert_eq!(stored.nickname, "nick @alice");

        // The failed insert did not consume an id.
        assert_eq!(repo.create(new_user("@bob")).unwrap().id, 2);
    }

    #[test]
    fn lookups_by_id_and_username_agree() {
        let (_dir, store) = temp_store();
        let repo = UserRepository::new(&store);
        let created = repo.create(new_user("@carol")).unwrap();

        let by_id = repo.get(created.id).unwrap();
        let by_name = repo.get_by_username(&created.username).unwrap();
        assert_eq!(by_id, by_name);
        assert_eq!(by_id.profile().username, "@carol");
    }

    #[test]
    fn missing_user_is_not_found() {
        let (_dir, store) = temp_store();
        let repo = UserRepository::new(&store);
        assert!(matches!(repo.get(42), Err(StorageError::NotFound(_))));
        assert!(matches!(
            repo.get_by_username(&Username::parse("@ghost").unwrap()),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn delete_frees_the_username() {
        let (_dir, store) = temp_store();
        let repo = UserRepository::new(&store);
        let name = Username::parse("@dave").unwrap();

        repo.create(new_user("@dave")).unwrap();
        let removed = repo.delete(&name).unwrap();
        assert_eq!(removed.username, name);
        assert!(!repo.exists(&name).unwrap());
        assert!(matches!(repo.delete(&name), Err(StorageError::NotFound(_))));

        let recreated = repo.create(new_user("@dave")).unwrap();
        assert_eq!(recreated.id, 2);
    }
}
