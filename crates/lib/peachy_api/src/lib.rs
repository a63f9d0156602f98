//! # peachy_api
//!
//! HTTP API library for PEACHY: Discord OAuth login, cookie and database
//! sessions, provider-token access and Discord REST proxies.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use peachy_core::auth::state::SignInStateStore;
use peachy_core::discord::{DiscordClient, DiscordCredentials};
use peachy_core::session::{PgSessionStore, SessionStore};
use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::handlers::{access_token, auth, discord, session};
use crate::middleware::cors::auth_cors;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Discord REST client.
    pub discord: DiscordClient,
    /// Session and account persistence.
    pub sessions: Arc<dyn SessionStore>,
    /// Pending sign-ins awaiting their provider callback.
    pub sign_in_states: Arc<SignInStateStore>,
}

impl AppState {
    /// Build state from config and a session store. The Discord client is
    /// derived from the configured credentials and API base.
    pub fn new(config: ApiConfig, sessions: Arc<dyn SessionStore>) -> Self {
        let discord = DiscordClient::with_base_url(
            DiscordCredentials {
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
            },
            config.discord_api_url.clone(),
        );
        Self {
            config,
            discord,
            sessions,
            sign_in_states: Arc::new(SignInStateStore::new()),
        }
    }
}

/// Run embedded database migrations.
///
/// The schema lives with `PgSessionStore` in `peachy_core`.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    PgSessionStore::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    // Cookie login flow (no session required)
    let public = Router::new()
        .route(routes::GET_AUTH_LOGIN, get(auth::login_handler))
        .route(
            routes::AUTH_CALLBACK,
            get(auth::callback_handler).post(auth::callback_handler),
        )
        .route(routes::GET_AUTH_SIGNOUT, get(auth::signout_handler))
        .route(routes::GET_AUTH_TOKEN, get(auth::token_handler));

    // Routes that need a database session
    let protected = Router::new()
        .route(
            routes::AUTH_GET_ACCESS_TOKEN,
            get(access_token::get_access_token_handler)
                .post(access_token::post_access_token_handler),
        )
        .route(routes::GET_DISCORD_USER, get(discord::current_user_handler))
        .route(routes::GET_DISCORD_GUILDS, get(discord::guilds_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session::require_session,
        ));

    // Generic session handler, CORS on every response
    let auth_library = Router::new()
        .route(
            routes::AUTH_CATCH_ALL,
            get(session::auth_handler).post(session::auth_handler),
        )
        .layer(auth_cors(&state.config.cors_origin));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(auth_library)
        .with_state(state)
}
