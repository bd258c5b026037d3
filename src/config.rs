// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! typed configuration each service is started with. Configuration is read
//! from the environment once at startup and then passed down explicitly.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8083` (identity), `8084` (chat) |
//! | `HTTP_TIMEOUT_SECS` | Per-request deadline before answering 408 | `30` |
//! | `DATA_DIR` | Directory holding the service's database file | `./storage` |
//! | `SESSION_SECRET` | HS256 key used to sign and verify session tokens | Required |
//! | `SESSION_TTL_SECS` | Session token lifetime in seconds | `43200` |
//! | `IDENTITY_URL` | Base URL of the identity service (chat only) | `http://localhost:8083` |
//! | `IDENTITY_TIMEOUT_MS` | Overall budget for participant validation | `5000` |
//! | `IDENTITY_CONCURRENCY` | Max in-flight participant lookups | `4` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{
    env,
    net::SocketAddr,
    path::PathBuf,
    time::Duration,
};

use url::Url;

/// Server bind address.
pub const HOST_ENV: &str = "HOST";

/// Server bind port.
pub const PORT_ENV: &str = "PORT";

/// Per-request deadline in seconds.
pub const HTTP_TIMEOUT_ENV: &str = "HTTP_TIMEOUT_SECS";

/// Directory containing the service's redb file.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Shared signing secret for session tokens.
///
/// Both services must be started with the same value: the identity service
/// signs tokens and the chat service verifies them.
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";

/// Session token lifetime in seconds.
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";

/// Base URL the chat service uses to reach the identity service.
pub const IDENTITY_URL_ENV: &str = "IDENTITY_URL";

/// Overall timeout for one participant-validation batch, in milliseconds.
pub const IDENTITY_TIMEOUT_ENV: &str = "IDENTITY_TIMEOUT_MS";

/// Upper bound on concurrent identity lookups per batch.
pub const IDENTITY_CONCURRENCY_ENV: &str = "IDENTITY_CONCURRENCY";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_IDENTITY_PORT: u16 = 8083;
pub const DEFAULT_CHAT_PORT: u16 = 8084;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DATA_DIR: &str = "./storage";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 12 * 60 * 60;
pub const DEFAULT_IDENTITY_URL: &str = "http://localhost:8083";
pub const DEFAULT_IDENTITY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_IDENTITY_CONCURRENCY: usize = 4;

/// File name of the identity service database inside `DATA_DIR`.
pub const IDENTITY_DB_FILE: &str = "identity.redb";

/// File name of the chat service database inside `DATA_DIR`.
pub const CHAT_DB_FILE: &str = "chat.redb";

/// Errors raised while assembling configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

// =============================================================================
// Shared pieces
// =============================================================================

/// Bind address and request deadline of an HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests still running after this long are answered with 408.
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            request_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    /// Read `HOST`/`PORT`/`HTTP_TIMEOUT_SECS`, falling back to the given
    /// default port.
    pub fn from_env(default_port: u16) -> Result<Self, ConfigError> {
        let timeout_secs: u64 = parse_var(HTTP_TIMEOUT_ENV, DEFAULT_HTTP_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: HTTP_TIMEOUT_ENV,
                value: "0".to_string(),
                reason: "must be at least one second".to_string(),
            });
        }

        Ok(Self {
            host: env::var(HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: parse_var(PORT_ENV, default_port)?,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            name: HOST_ENV,
            value: raw.clone(),
            reason: e.to_string(),
        })
    }
}

/// Session token signing parameters.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: Vec<u8>,
    pub ttl: Duration,
}

impl TokenConfig {
    /// Build a token config, rejecting an empty secret.
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::Empty(SESSION_SECRET_ENV));
        }
        Ok(Self { secret, ttl })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = env::var(SESSION_SECRET_ENV).map_err(|_| ConfigError::Missing(SESSION_SECRET_ENV))?;
        let ttl = parse_var(SESSION_TTL_ENV, DEFAULT_SESSION_TTL_SECS)?;
        Self::new(secret, Duration::from_secs(ttl))
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

// =============================================================================
// Per-service configuration
// =============================================================================

/// Configuration of the identity service.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub server: ServerConfig,
    pub data_dir: PathBuf,
    pub token: TokenConfig,
}

impl IdentityConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env(DEFAULT_IDENTITY_PORT)?,
            data_dir: data_dir_from_env(),
            token: TokenConfig::from_env()?,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(IDENTITY_DB_FILE)
    }
}

/// How the chat service reaches the identity service.
#[derive(Debug, Clone)]
pub struct IdentityClientConfig {
    pub base_url: Url,
    /// Budget for a whole participant-validation batch.
    pub timeout: Duration,
    /// Max lookups in flight at once.
    pub concurrency: usize,
}

impl IdentityClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url(base_url)?,
            timeout: Duration::from_millis(DEFAULT_IDENTITY_TIMEOUT_MS),
            concurrency: DEFAULT_IDENTITY_CONCURRENCY,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = env::var(IDENTITY_URL_ENV).unwrap_or_else(|_| DEFAULT_IDENTITY_URL.to_string());
        let timeout_ms = parse_var(IDENTITY_TIMEOUT_ENV, DEFAULT_IDENTITY_TIMEOUT_MS)?;
        let concurrency = parse_var(IDENTITY_CONCURRENCY_ENV, DEFAULT_IDENTITY_CONCURRENCY)?;
        if concurrency == 0 {
            return Err(ConfigError::Invalid {
                name: IDENTITY_CONCURRENCY_ENV,
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            base_url: parse_url(&raw)?,
            timeout: Duration::from_millis(timeout_ms),
            concurrency,
        })
    }
}

/// Configuration of the chat service.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub server: ServerConfig,
    pub data_dir: PathBuf,
    pub token: TokenConfig,
    pub identity: IdentityClientConfig,
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env(DEFAULT_CHAT_PORT)?,
            data_dir: data_dir_from_env(),
            token: TokenConfig::from_env()?,
            identity: IdentityClientConfig::from_env()?,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(CHAT_DB_FILE)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn data_dir_from_env() -> PathBuf {
    env::var(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR))
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name: IDENTITY_URL_ENV,
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::Invalid {
            name: IDENTITY_URL_ENV,
            value: raw.to_string(),
            reason: "not a base URL".to_string(),
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_rejected() {
        let err = TokenConfig::new(Vec::new(), Duration::from_secs(60)).unwrap_err();
        assert!(matches!(err, ConfigError::Empty(SESSION_SECRET_ENV)));
    }

    #[test]
    fn token_config_debug_redacts_secret() {
        let config = TokenConfig::new("hunter2", Duration::from_secs(60)).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn identity_client_rejects_non_base_url() {
        assert!(IdentityClientConfig::new("mailto:someone@example.com").is_err());
        assert!(IdentityClientConfig::new("not a url").is_err());
    }

    #[test]
    fn identity_client_defaults() {
        let config = IdentityClientConfig::new("http://127.0.0.1:8083").unwrap();
        assert_eq!(config.timeout, Duration::from_millis(DEFAULT_IDENTITY_TIMEOUT_MS));
        assert_eq!(config.concurrency, DEFAULT_IDENTITY_CONCURRENCY);
    }

    #[test]
    fn server_socket_addr_parses() {
        let server = ServerConfig::new("127.0.0.1", 9000);
        assert_eq!(server.socket_addr().unwrap().port(), 9000);
        assert_eq!(
            server.request_timeout,
            Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)
        );

        let bad = ServerConfig::new("not a host", 9000);
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn database_paths_are_per_service() {
        let token = TokenConfig::new("s", Duration::from_secs(1)).unwrap();
        let server = ServerConfig::new(DEFAULT_HOST, 1);
        let identity = IdentityConfig {
            server: server.clone(),
            data_dir: PathBuf::from("/tmp/x"),
            token: token.clone(),
        };
        let chat = ChatConfig {
            server,
            data_dir: PathBuf::from("/tmp/x"),
            token,
            identity: IdentityClientConfig::new(DEFAULT_IDENTITY_URL).unwrap(),
        };
        assert_ne!(identity.database_path(), chat.database_path());
    }
}
