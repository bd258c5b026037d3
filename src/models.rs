// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of both services. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI docs.
//!
//! Request bodies use PascalCase field names (`Username`, `ChatName`, `ID`)
//! because that is what existing clients send.
//!
//! ## Model Categories
//!
//! - **Usernames**: the `@`-prefixed handle shared by both services
//! - **Identity**: registration, login and profile bodies
//! - **Chats**: chat creation and chat views
//! - **Messages**: message writes

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Username Type
// =============================================================================

/// Sigil every username starts with.
pub const USERNAME_SIGIL: char = '@';

/// A validated username handle such as `@alice`.
///
/// Rules: starts with `@`, has at least one character after it, and contains
/// no whitespace and no commas (commas separate participants in a chat).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

/// Why a string is not a valid username.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsernameError {
    #[error("username must not be empty")]
    Empty,
    #[error("username must start with '@'")]
    MissingSigil,
    #[error("username must contain at least one character after '@'")]
    SigilOnly,
    #[error("username must not contain whitespace, commas or control characters")]
    InvalidCharacter,
}

impl Username {
    /// Validate and wrap a raw username. Surrounding whitespace is trimmed.
    pub fn parse(raw: &str) -> Result<Self, UsernameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UsernameError::Empty);
        }
        let Some(rest) = trimmed.strip_prefix(USERNAME_SIGIL) else {
            return Err(UsernameError::MissingSigil);
        };
        if rest.is_empty() {
            return Err(UsernameError::SigilOnly);
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == ',')
        {
            return Err(UsernameError::InvalidCharacter);
        }
        Ok(Username(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Username::parse(&value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Shared
// =============================================================================

/// Plain confirmation message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Identity Models
// =============================================================================

/// Body of `POST /chat/register`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterRequest {
    /// Handle starting with `@`.
    pub username: String,
    pub password: String,
    /// Display name shown to other chat participants.
    pub nickname: String,
    #[serde(default)]
    pub bio: String,
}

/// Body of `POST /chat/login`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login. The same token is also set as the `auth_token` cookie.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

/// Public profile of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct UserProfile {
    pub username: String,
    pub nickname: String,
    pub bio: String,
}

/// Response of `GET /chat/{username}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserResponse {
    pub user: UserProfile,
}

/// Response of `GET /users/me`: the profile behind the caller's session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CurrentUserResponse {
    pub id: u64,
    pub user: UserProfile,
}

// =============================================================================
// Chat Models
// =============================================================================

/// Body of `POST /chat/make`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MakeChatRequest {
    #[serde(rename = "Name")]
    pub name: String,
    /// Comma-separated usernames, e.g. `"@alice, @bob"`.
    #[serde(rename = "Participants", alias = "Participants(usernames)")]
    pub participants: String,
}

/// Response of `POST /chat/make`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ChatCreatedResponse {
    pub message: String,
    pub name: String,
    pub id: u64,
}

/// A message as shown inside a chat view.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MessageView {
    pub id: u64,
    pub sender: String,
    pub text: String,
}

/// Response of `GET /chat/{chat_name}/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ChatView {
    pub name: String,
    /// Participant nicknames joined by `", "`, in participant order.
    pub participants: String,
    /// Messages in ascending id order.
    pub messages: Vec<MessageView>,
}

// =============================================================================
// Message Models
// =============================================================================

/// Body of `POST /chat/write`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WriteMessageRequest {
    #[serde(rename = "ChatName")]
    pub chat_name: String,
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "Text")]
    pub text: String,
}

/// Response of `POST /chat/write`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MessageWrittenResponse {
    pub message: String,
    pub id: u64,
}
