// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Membership enforcement for chat storage.
//!
//! A chat's participants are held as a parsed [`ParticipantSet`] and every
//! membership decision is an exact comparison of whole usernames, so `@al`
//! is never a member of a chat with `@alice`.

use crate::models::{Username, UsernameError};

use super::{StorageError, StorageResult};

// =============================================================================
// Participant Set
// =============================================================================

/// Why a raw participant list could not be accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParticipantSetError {
    #[error("participant list is empty")]
    Empty,
    /// Entries that are not well-formed usernames, in input order.
    #[error("invalid participant usernames: {}", .0.join(", "))]
    Invalid(Vec<String>),
}

/// Ordered, de-duplicated set of chat participants.
///
/// Order is the order of first appearance in the input and is used for
/// display. Uniqueness comparisons use the sorted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSet {
    members: Vec<Username>,
}

impl ParticipantSet {
    /// Parse a comma-separated participant list.
    ///
    /// Entries are trimmed, empty entries dropped and repeats removed keeping
    /// the first occurrence. Every remaining entry must be a valid username.
    pub fn parse(raw: &str) -> Result<Self, ParticipantSetError> {
        let mut members: Vec<Username> = Vec::new();
        let mut invalid = Vec::new();

        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match Username::parse(entry) {
                Ok(name) => {
                    if !members.contains(&name) {
                        members.push(name);
                    }
                }
                Err(UsernameError::Empty) => {}
                Err(_) => {
                    if !invalid.iter().any(|i: &String| i == entry) {
                        invalid.push(entry.to_string());
                    }
                }
            }
        }

        if !invalid.is_empty() {
            return Err(ParticipantSetError::Invalid(invalid));
        }
        Self::from_usernames(members)
    }

    /// Build a set from already-validated usernames.
    pub fn from_usernames(usernames: Vec<Username>) -> Result<Self, ParticipantSetError> {
        let mut members: Vec<Username> = Vec::with_capacity(usernames.len());
        for name in usernames {
            if !members.contains(&name) {
                members.push(name);
            }
        }
        if members.is_empty() {
            return Err(ParticipantSetError::Empty);
        }
        Ok(Self { members })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn as_slice(&self) -> &[Username] {
        &self.members
    }

    /// Exact-token membership test.
    pub fn contains(&self, username: &Username) -> bool {
        self.members.iter().any(|m| m == username)
    }

    /// Display form: usernames in input order joined by `", "`.
    pub fn canonical(&self) -> String {
        join(self.members.iter().map(Username::as_str))
    }

    /// Key identifying a chat among all chats: the exact name plus the
    /// sorted participant set, so member order does not matter.
    ///
    /// Usernames never contain the `\u{1f}` separator or commas, so the last
    /// separator always splits the name from the members.
    pub fn chat_key(&self, chat_name: &str) -> String {
        let mut sorted: Vec<&str> = self.members.iter().map(Username::as_str).collect();
        sorted.sort_unstable();
        format!("{chat_name}\u{1f}{}", sorted.join(","))
    }
}

/// Join display parts with the participant separator.
pub fn join<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(", ")
}

// =============================================================================
// Enforcement
// =============================================================================

/// Trait for resources restricted to a set of participants.
pub trait MemberResource {
    /// Participants allowed to access the resource.
    fn participants(&self) -> &[Username];

    /// Short description used in denial errors.
    fn describe(&self) -> String;
}

/// Trait for enforcing membership on storage operations.
pub trait MembershipEnforcer {
    /// Verify that `user` is one of the resource's participants.
    ///
    /// # Errors
    /// Returns `StorageError::PermissionDenied` if the user is not a member.
    fn verify_member(&self, user: &Username) -> StorageResult<()>;
}

impl<T: MemberResource> MembershipEnforcer for T {
    fn verify_member(&self, user: &Username) -> StorageResult<()> {
        if self.participants().iter().any(|p| p == user) {
            Ok(())
        } else {
            Err(StorageError::PermissionDenied {
                user: user.to_string(),
                resource: self.describe(),
            })
        }
    }
}
