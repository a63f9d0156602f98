//! Shared fixtures for router tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use axum_extra::extract::cookie::Cookie;
use chrono::{DateTime, Duration, Utc};
use peachy_api::config::{ApiConfig, default_scopes};
use peachy_api::{AppState, router};
use peachy_core::models::auth::{DISCORD_PROVIDER, ProviderToken, Session};
use peachy_core::session::{
    AccountLookup, AccountRecord, LinkedAccount, MemorySessionStore, SessionError, SessionStore,
};
use tower::ServiceExt;

pub const APP_URL: &str = "http://localhost:3000";
pub const CORS_ORIGIN: &str = "https://peachy.vercel.app";

pub fn test_config(discord_api_url: &str) -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        database_url: None,
        client_id: "client-1".into(),
        client_secret: "secret-1".into(),
        app_url: APP_URL.into(),
        auth_url: APP_URL.into(),
        cors_origin: CORS_ORIGIN.into(),
        production: false,
        discord_api_url: discord_api_url.into(),
        scopes: default_scopes(),
    }
}

/// Router plus direct access to its in-memory store.
pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemorySessionStore>,
    pub state: AppState,
}

impl TestApp {
    pub fn new(discord_api_url: &str) -> Self {
        let store = Arc::new(MemorySessionStore::new());
        let state = AppState::new(test_config(discord_api_url), store.clone());
        Self {
            app: router(state.clone()),
            store,
            state,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(req).await.expect("request")
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }
}

/// Store whose every call fails as if the database pool were gone.
pub struct UnavailableStore;

fn pool_closed() -> SessionError {
    SessionError::DbError(sqlx::Error::PoolClosed)
}

#[async_trait]
impl SessionStore for UnavailableStore {
    async fn upsert_account(&self, _: &LinkedAccount) -> Result<String, SessionError> {
        Err(pool_closed())
    }

    async fn create_session(
        &self,
        _: &str,
        _: BTreeMap<String, ProviderToken>,
        _: DateTime<Utc>,
    ) -> Result<Session, SessionError> {
        Err(pool_closed())
    }

    async fn find_session(&self, _: &str) -> Result<Option<Session>, SessionError> {
        Err(pool_closed())
    }

    async fn delete_session(&self, _: &str) -> Result<bool, SessionError> {
        Err(pool_closed())
    }

    async fn find_account(&self, _: &AccountLookup) -> Result<Option<AccountRecord>, SessionError> {
        Err(pool_closed())
    }

    async fn update_account_token(&self, _: &str, _: &ProviderToken) -> Result<(), SessionError> {
        Err(pool_closed())
    }
}

/// Router backed by [`UnavailableStore`].
pub fn unavailable_app(discord_api_url: &str) -> Router {
    router(AppState::new(
        test_config(discord_api_url),
        Arc::new(UnavailableStore),
    ))
}

pub fn discord_token(access: &str, expires_in_secs: i64) -> ProviderToken {
    ProviderToken {
        access_token: access.into(),
        refresh_token: Some(format!("{access}-refresh")),
        expires_at: Some(Utc::now() + Duration::seconds(expires_in_secs)),
        scopes: vec!["identify".into(), "guilds".into()],
    }
}

/// Link a Discord account holding `account_token` and open a session,
/// optionally embedding `embedded` in it.
pub async fn seed_session(
    store: &MemorySessionStore,
    account_token: ProviderToken,
    embedded: Option<ProviderToken>,
) -> Session {
    let user_id = store
        .upsert_account(&LinkedAccount {
            provider_id: DISCORD_PROVIDER.into(),
            account_id: "80351110224678912".into(),
            name: "peach".into(),
            email: Some("peach@example.com".into()),
            image: None,
            token: account_token,
        })
        .await
        .expect("upsert account");
    let provider_tokens = embedded
        .map(|t| BTreeMap::from([(DISCORD_PROVIDER.to_string(), t)]))
        .unwrap_or_default();
    store
        .create_session(&user_id, provider_tokens, Utc::now() + Duration::days(7))
        .await
        .expect("create session")
}

pub fn session_cookie_header(token: &str) -> String {
    format!("better-auth.session_token={token}")
}

/// Percent-encoded `ts-token=<json>` cookie pair.
pub fn token_cookie_header(json: &str) -> String {
    Cookie::new("ts-token", json.to_string())
        .encoded()
        .to_string()
}

pub async fn body_json(resp: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}

pub fn location(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Set-Cookie header for `name`, decoded.
pub fn set_cookie(resp: &Response<Body>, name: &str) -> Option<Cookie<'static>> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse_encoded(v.to_string()).ok())
        .find(|c| c.name() == name)
}
