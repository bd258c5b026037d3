// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Chat - identity and chat services
//!
//! Two HTTP services share this library. The identity service registers
//! users, checks passwords and issues session tokens. The chat service
//! creates chats and stores messages, asking the identity service whether
//! participants exist before it stores anything.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers and routers of both services (Axum)
//! - `auth` - Session tokens, the cookie gate and password hashing
//! - `chats` - Chat authorization and the identity directory client
//! - `credentials` - Credential store behind registration and login
//! - `storage` - Embedded database (redb), repositories and membership

pub mod api;
pub mod auth;
pub mod chats;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod models;
pub mod server;
pub mod state;
pub mod storage;
