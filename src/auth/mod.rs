// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session tokens shared by the identity and chat services.
//!
//! ## Auth Flow
//!
//! 1. Client logs in at the identity service (`POST /chat/login`)
//! 2. Identity service returns a signed token and sets it as the
//!    `auth_token` cookie
//! 3. Either service, on a protected route:
//!    - Reads the `auth_token` cookie
//!    - Verifies the HS256 signature and expiry with the shared secret
//!    - Extracts `sub` → user id
//!
//! ## Security
//!
//! - Tokens are not stored server-side and cannot be revoked early
//! - No clock skew tolerance
//! - The `your_username` cookie is informational and never trusted

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod token;

pub use claims::{Session, SessionClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use middleware::{require_session, SESSION_COOKIE, USERNAME_COOKIE};
pub use token::{TokenError, TokenService};
