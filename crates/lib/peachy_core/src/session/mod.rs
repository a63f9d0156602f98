//! Session store.
//!
//! `SessionStore` is the seam between HTTP handlers and persistence. The
//! Postgres implementation is canonical; the in-memory implementation backs
//! tests and local runs without a database.

pub mod access;
pub mod memory;
pub mod postgres;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::models::auth::{ProviderToken, Session};

pub use memory::MemorySessionStore;
pub use postgres::PgSessionStore;

/// Session lifetime: 7 days.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Default session expiry counted from `now`.
pub fn default_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(SESSION_TTL_DAYS)
}

/// Session store errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Session data error: {0}")]
    Data(#[from] serde_json::Error),

    #[error("User not found: {0}")]
    UserNotFound(String),
}

/// Profile and tokens of a provider account being linked at sign-in.
#[derive(Debug, Clone)]
pub struct LinkedAccount {
    pub provider_id: String,
    /// Provider-side account id (Discord user snowflake).
    pub account_id: String,
    pub name: String,
    pub email: Option<String>,
    pub image: Option<String>,
    pub token: ProviderToken,
}

/// A stored provider account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub id: String,
    pub user_id: String,
    pub provider_id: String,
    pub account_id: String,
    pub token: Option<ProviderToken>,
}

/// Which account to read a provider token from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountLookup {
    pub provider_id: String,
    pub user_id: String,
    /// Narrow to one provider account when a user linked several.
    pub account_id: Option<String>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create or update the user behind a provider account and store the
    /// account's tokens. Returns the local user id.
    async fn upsert_account(&self, account: &LinkedAccount) -> Result<String, SessionError>;

    /// Create a session for `user_id`. The returned session carries the
    /// plaintext token; only its hash is stored.
    async fn create_session(
        &self,
        user_id: &str,
        provider_tokens: BTreeMap<String, ProviderToken>,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, SessionError>;

    /// Look up a live session by plaintext token. Expired sessions are
    /// deleted and reported as absent.
    async fn find_session(&self, token: &str) -> Result<Option<Session>, SessionError>;

    /// Delete a session. Returns whether a row was removed.
    async fn delete_session(&self, token: &str) -> Result<bool, SessionError>;

    /// Most recently updated account matching `lookup`.
    async fn find_account(
        &self,
        lookup: &AccountLookup,
    ) -> Result<Option<AccountRecord>, SessionError>;

    /// Replace the stored tokens of an account (after a refresh).
    async fn update_account_token(
        &self,
        account_id: &str,
        token: &ProviderToken,
    ) -> Result<(), SessionError>;
}
