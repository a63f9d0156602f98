//! Discord REST proxies for the dashboard.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::session::AuthenticatedSession;
use crate::models::{AccessTokenParams, DiscordUserResponse, GuildResponse};
use crate::services::access::resolve_provider_token;

/// `GET /api/discord/user`: the signed-in Discord user.
pub async fn current_user_handler(
    State(state): State<AppState>,
    axum::Extension(session): axum::Extension<AuthenticatedSession>,
) -> AppResult<Json<DiscordUserResponse>> {
    let token = resolve_provider_token(&state, &session.0, &AccessTokenParams::default()).await?;
    let user = state.discord.current_user(&token.access_token).await?;
    Ok(Json(user.into()))
}

/// `GET /api/discord/guilds`: guilds of the signed-in user.
pub async fn guilds_handler(
    State(state): State<AppState>,
    axum::Extension(session): axum::Extension<AuthenticatedSession>,
) -> AppResult<Json<Vec<GuildResponse>>> {
    let token = resolve_provider_token(&state, &session.0, &AccessTokenParams::default()).await?;
    let guilds = state.discord.current_user_guilds(&token.access_token).await?;
    Ok(Json(guilds.into_iter().map(GuildResponse::from).collect()))
}
