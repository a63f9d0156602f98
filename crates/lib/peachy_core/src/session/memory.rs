//! In-memory session store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{AccountLookup, AccountRecord, LinkedAccount, SessionError, SessionStore};
use crate::auth::tokens::{generate_session_token, hash_session_token};
use crate::ids::{record_id, session_id};
use crate::models::auth::{ProviderToken, Session, SessionUser};

#[derive(Debug, Clone)]
struct StoredAccount {
    record: AccountRecord,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredSession {
    id: String,
    user_id: String,
    expires_at: DateTime<Utc>,
    provider_tokens: BTreeMap<String, ProviderToken>,
}

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    users: DashMap<String, SessionUser>,
    /// Keyed by `(provider_id, account_id)`.
    accounts: DashMap<(String, String), StoredAccount>,
    /// Keyed by session token hash.
    sessions: DashMap<String, StoredSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn upsert_account(&self, account: &LinkedAccount) -> Result<String, SessionError> {
        let key = (account.provider_id.clone(), account.account_id.clone());
        let now = Utc::now();

        // Lookup and insert happen under one entry lock.
        let user_id = match self.accounts.entry(key) {
            Entry::Occupied(mut entry) => {
                let stored = entry.get_mut();
                stored.record.token = Some(account.token.clone());
                stored.updated_at = now;
                stored.record.user_id.clone()
            }
            Entry::Vacant(entry) => {
                let user_id = record_id();
                entry.insert(StoredAccount {
                    record: AccountRecord {
                        id: record_id(),
                        user_id: user_id.clone(),
                        provider_id: account.provider_id.clone(),
                        account_id: account.account_id.clone(),
                        token: Some(account.token.clone()),
                    },
                    updated_at: now,
                });
                user_id
            }
        };

        self.users.insert(
            user_id.clone(),
            SessionUser {
                id: user_id.clone(),
                name: account.name.clone(),
                email: account.email.clone(),
                image: account.image.clone(),
            },
        );
        Ok(user_id)
    }

    async fn create_session(
        &self,
        user_id: &str,
        provider_tokens: BTreeMap<String, ProviderToken>,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        let user = self
            .users
            .get(user_id)
            .map(|u| u.clone())
            .ok_or_else(|| SessionError::UserNotFound(user_id.to_string()))?;
        let token = generate_session_token();
        let stored = StoredSession {
            id: session_id(),
            user_id: user_id.to_string(),
            expires_at,
            provider_tokens,
        };
        self.sessions
            .insert(hash_session_token(&token), stored.clone());
        Ok(Session {
            id: stored.id,
            user,
            expires_at,
            token,
            provider_tokens: stored.provider_tokens,
        })
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>, SessionError> {
        let hash = hash_session_token(token);
        let Some(stored) = self.sessions.get(&hash).map(|s| s.clone()) else {
            return Ok(None);
        };
        if stored.expires_at <= Utc::now() {
            self.sessions.remove(&hash);
            return Ok(None);
        }
        let Some(user) = self.users.get(&stored.user_id).map(|u| u.clone()) else {
            return Ok(None);
        };
        Ok(Some(Session {
            id: stored.id,
            user,
            expires_at: stored.expires_at,
            token: token.to_string(),
            provider_tokens: stored.provider_tokens,
        }))
    }

    async fn delete_session(&self, token: &str) -> Result<bool, SessionError> {
        Ok(self.sessions.remove(&hash_session_token(token)).is_some())
    }

    async fn find_account(
        &self,
        lookup: &AccountLookup,
    ) -> Result<Option<AccountRecord>, SessionError> {
        let found = self
            .accounts
            .iter()
            .filter(|entry| {
                let r = &entry.record;
                r.provider_id == lookup.provider_id
                    && r.user_id == lookup.user_id
                    && lookup.account_id.as_ref().is_none_or(|id| *id == r.account_id)
            })
            .max_by_key(|entry| entry.updated_at)
            .map(|entry| entry.record.clone());
        Ok(found)
    }

    async fn update_account_token(
        &self,
        account_id: &str,
        token: &ProviderToken,
    ) -> Result<(), SessionError> {
        for mut entry in self.accounts.iter_mut() {
            if entry.record.id == account_id {
                entry.record.token = Some(token.clone());
                entry.updated_at = Utc::now();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::DISCORD_PROVIDER;
    use chrono::Duration;

    fn linked(account_id: &str, access: &str) -> LinkedAccount {
        LinkedAccount {
            provider_id: DISCORD_PROVIDER.into(),
            account_id: account_id.into(),
            name: "peach".into(),
            email: Some("peach@example.com".into()),
            image: None,
            token: ProviderToken {
                access_token: access.into(),
                refresh_token: None,
                expires_at: None,
                scopes: vec!["identify".into()],
            },
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_provider_account() {
        let store = MemorySessionStore::new();
        let first = store.upsert_account(&linked("a1", "t1")).await.unwrap();
        let second = store.upsert_account(&linked("a1", "t2")).await.unwrap();
        assert_eq!(first, second);

        let account = store
            .find_account(&AccountLookup {
                provider_id: DISCORD_PROVIDER.into(),
                user_id: first,
                account_id: None,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.token.unwrap().access_token, "t2");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_sign_ins_share_one_user() {
        let store = std::sync::Arc::new(MemorySessionStore::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .upsert_account(&linked("a1", &format!("t{i}")))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut user_ids = Vec::new();
        for handle in handles {
            user_ids.push(handle.await.unwrap());
        }
        user_ids.dedup();
        assert_eq!(user_ids.len(), 1);
        assert_eq!(store.users.len(), 1);
        assert_eq!(store.accounts.len(), 1);
    }

    #[tokio::test]
    async fn session_round_trip_and_delete() {
        let store = MemorySessionStore::new();
        let user_id = store.upsert_account(&linked("a1", "t1")).await.unwrap();
        let session = store
            .create_session(&user_id, BTreeMap::new(), Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        let found = store.find_session(&session.token).await.unwrap().unwrap();
        assert_eq!(found.id, session.id);
        assert_eq!(found.user.email.as_deref(), Some("peach@example.com"));

        assert!(store.delete_session(&session.token).await.unwrap());
        assert!(store.find_session(&session.token).await.unwrap().is_none());
        assert!(!store.delete_session(&session.token).await.unwrap());
    }

    #[tokio::test]
    async fn expired_session_is_evicted_on_lookup() {
        let store = MemorySessionStore::new();
        let user_id = store.upsert_account(&linked("a1", "t1")).await.unwrap();
        let session = store
            .create_session(&user_id, BTreeMap::new(), Utc::now() - Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(store.session_count(), 1);
        assert!(store.find_session(&session.token).await.unwrap().is_none());
        assert_eq!(store.session_count(), 0);
    }

    #[tokio::test]
    async fn create_session_for_unknown_user_fails() {
        let store = MemorySessionStore::new();
        let err = store
            .create_session("ghost", BTreeMap::new(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn find_account_respects_account_id_filter() {
        let store = MemorySessionStore::new();
        let user_id = store.upsert_account(&linked("a1", "t1")).await.unwrap();
        let lookup = AccountLookup {
            provider_id: DISCORD_PROVIDER.into(),
            user_id: user_id.clone(),
            account_id: Some("other".into()),
        };
        assert!(store.find_account(&lookup).await.unwrap().is_none());

        let lookup = AccountLookup {
            account_id: Some("a1".into()),
            ..lookup
        };
        assert!(store.find_account(&lookup).await.unwrap().is_some());
    }
}
