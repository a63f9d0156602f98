//! Postgres-backed session store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::debug;

use super::{AccountLookup, AccountRecord, LinkedAccount, SessionError, SessionStore};
use crate::auth::scopes::split_scopes;
use crate::auth::tokens::{generate_session_token, hash_session_token};
use crate::models::auth::{ProviderToken, Session, SessionUser};
use crate::ids::session_id;

/// JSONB payload of a session row.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionData {
    #[serde(default)]
    provider_tokens: BTreeMap<String, ProviderToken>,
}

type SessionRow = (
    String,
    DateTime<Utc>,
    Json<SessionData>,
    String,
    String,
    Option<String>,
    Option<String>,
);

type AccountRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<DateTime<Utc>>,
    String,
);

/// Store over a shared `PgPool`. The pool is created once per process and
/// injected here.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded `users`/`accounts`/`sessions` schema migrations.
    pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn account_from_row(row: AccountRow) -> AccountRecord {
    let (id, user_id, provider_id, account_id, access, refresh, expires_at, scope) = row;
    let token = access.filter(|t| !t.is_empty()).map(|access_token| ProviderToken {
        access_token,
        refresh_token: refresh.filter(|t| !t.is_empty()),
        expires_at,
        scopes: split_scopes(&scope),
    });
    AccountRecord {
        id,
        user_id,
        provider_id,
        account_id,
        token,
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn upsert_account(&self, account: &LinkedAccount) -> Result<String, SessionError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_scalar::<_, String>(
            "SELECT user_id::text FROM accounts WHERE provider_id = $1 AND account_id = $2",
        )
        .bind(&account.provider_id)
        .bind(&account.account_id)
        .fetch_optional(&mut *tx)
        .await?;

        let user_id = match existing {
            Some(user_id) => {
                sqlx::query(
                    "UPDATE users SET name = $2, email = $3, image = $4, updated_at = now() \
                     WHERE id = $1::uuid",
                )
                .bind(&user_id)
                .bind(&account.name)
                .bind(&account.email)
                .bind(&account.image)
                .execute(&mut *tx)
                .await?;
                user_id
            }
            None => {
                sqlx::query_scalar::<_, String>(
                    "INSERT INTO users (name, email, image) VALUES ($1, $2, $3) RETURNING id::text",
                )
                .bind(&account.name)
                .bind(&account.email)
                .bind(&account.image)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        sqlx::query(
            "INSERT INTO accounts \
                 (user_id, provider_id, account_id, access_token, refresh_token, \
                  access_token_expires_at, scope) \
             VALUES ($1::uuid, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (provider_id, account_id) DO UPDATE SET \
                 access_token = EXCLUDED.access_token, \
                 refresh_token = EXCLUDED.refresh_token, \
                 access_token_expires_at = EXCLUDED.access_token_expires_at, \
                 scope = EXCLUDED.scope, \
                 updated_at = now()",
        )
        .bind(&user_id)
        .bind(&account.provider_id)
        .bind(&account.account_id)
        .bind(&account.token.access_token)
        .bind(&account.token.refresh_token)
        .bind(account.token.expires_at)
        .bind(account.token.scope_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(user_id = %user_id, provider_id = %account.provider_id, "linked provider account");
        Ok(user_id)
    }

    async fn create_session(
        &self,
        user_id: &str,
        provider_tokens: BTreeMap<String, ProviderToken>,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        let user = sqlx::query_as::<_, (String, String, Option<String>, Option<String>)>(
            "SELECT id::text, name, email, image FROM users WHERE id = $1::uuid",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(|(id, name, email, image)| SessionUser {
            id,
            name,
            email,
            image,
        })
        .ok_or_else(|| SessionError::UserNotFound(user_id.to_string()))?;

        let id = session_id();
        let token = generate_session_token();
        let data = SessionData { provider_tokens };

        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at, data) \
             VALUES ($1::uuid, $2::uuid, $3, $4, $5)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(hash_session_token(&token))
        .bind(expires_at)
        .bind(Json(&data))
        .execute(&self.pool)
        .await?;

        Ok(Session {
            id,
            user,
            expires_at,
            token,
            provider_tokens: data.provider_tokens,
        })
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>, SessionError> {
        let hash = hash_session_token(token);
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT s.id::text, s.expires_at, s.data, u.id::text, u.name, u.email, u.image \
             FROM sessions s JOIN users u ON u.id = s.user_id \
             WHERE s.token_hash = $1",
        )
        .bind(&hash)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, expires_at, Json(data), user_id, name, email, image)) = row else {
            return Ok(None);
        };

        if expires_at <= Utc::now() {
            sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
                .bind(&hash)
                .execute(&self.pool)
                .await?;
            debug!(session_id = %id, "evicted expired session");
            return Ok(None);
        }

        Ok(Some(Session {
            id,
            user: SessionUser {
                id: user_id,
                name,
                email,
                image,
            },
            expires_at,
            token: token.to_string(),
            provider_tokens: data.provider_tokens,
        }))
    }

    async fn delete_session(&self, token: &str) -> Result<bool, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(hash_session_token(token))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_account(
        &self,
        lookup: &AccountLookup,
    ) -> Result<Option<AccountRecord>, SessionError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id::text, user_id::text, provider_id, account_id, access_token, \
                    refresh_token, access_token_expires_at, scope \
             FROM accounts \
             WHERE provider_id = $1 AND user_id = $2::uuid \
               AND ($3::text IS NULL OR account_id = $3) \
             ORDER BY updated_at DESC \
             LIMIT 1",
        )
        .bind(&lookup.provider_id)
        .bind(&lookup.user_id)
        .bind(&lookup.account_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(account_from_row))
    }

    async fn update_account_token(
        &self,
        account_id: &str,
        token: &ProviderToken,
    ) -> Result<(), SessionError> {
        sqlx::query(
            "UPDATE accounts SET access_token = $2, refresh_token = $3, \
                 access_token_expires_at = $4, scope = $5, updated_at = now() \
             WHERE id = $1::uuid",
        )
        .bind(account_id)
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(token.expires_at)
        .bind(token.scope_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
