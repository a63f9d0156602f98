//! Generic session handler behind `/api/auth/{*rest}`.
//!
//! Serves the database-session endpoints the browser client calls:
//! `sign-in/social`, `callback/discord`, `get-session`, `sign-out` and `ok`.
//! CORS headers are attached by the layer wrapping this route.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use peachy_core::models::auth::DISCORD_PROVIDER;
use tracing::{error, warn};

use super::{found, request_params};
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::session::{resolve_session, session_token};
use crate::models::{CallbackParams, OkResponse, SocialSignInParams, SuccessResponse};
use crate::services::cookies::{clear_session_cookie, session_cookie};
use crate::services::signin::{SignInError, complete_discord_sign_in, start_social_sign_in};

/// Dispatch on the path below `/api/auth/`.
pub async fn auth_handler(
    State(state): State<AppState>,
    method: Method,
    Path(rest): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<Response> {
    let path = rest.trim_matches('/');
    match (path, &method) {
        ("ok", &Method::GET) => Ok(Json(OkResponse { ok: true }).into_response()),
        ("sign-in/social", _) => {
            let params: SocialSignInParams = request_params(&uri, &body)?;
            Ok(Json(start_social_sign_in(&state, &params)?).into_response())
        }
        ("callback/discord", _) => Ok(discord_callback(&state, &uri, jar).await),
        ("get-session", &Method::GET) => get_session(&state, &headers).await,
        ("sign-out", _) => Ok(sign_out(&state, &headers, jar).await),
        _ => Err(AppError::NotFound(format!("{method} /api/auth/{path}"))),
    }
}

async fn discord_callback(state: &AppState, uri: &Uri, jar: CookieJar) -> Response {
    let config = &state.config;

    let params = match Query::<CallbackParams>::try_from_uri(uri) {
        Ok(Query(params)) => params,
        Err(e) => {
            warn!(error = %e, "unreadable Discord callback query");
            return found(config.login_url(Some("server_error")));
        }
    };

    if let Some(reason) = params.error.as_deref() {
        warn!(error = %reason, "Discord authorization was not granted");
        return found(config.login_url(Some("access_denied")));
    }
    let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
        return found(config.login_url(Some("no_code")));
    };
    let Some(csrf) = params.state.as_deref().filter(|s| !s.is_empty()) else {
        return found(config.login_url(Some(SignInError::InvalidState.code())));
    };

    match complete_discord_sign_in(state, code, csrf).await {
        Ok((session, callback_path)) => {
            let cookie = session_cookie(&session.token, session.expires_at, config.secure_origin());
            (jar.add(cookie), found(config.app_link(&callback_path))).into_response()
        }
        Err(e) => {
            error!(error = %e, code = e.code(), "Discord sign-in failed");
            found(config.login_url(Some(e.code())))
        }
    }
}

/// Session JSON without embedded provider tokens, or `null`.
async fn get_session(state: &AppState, headers: &HeaderMap) -> AppResult<Response> {
    let Some(mut session) = resolve_session(state, headers).await? else {
        return Ok(Json(serde_json::Value::Null).into_response());
    };
    session.provider_tokens.clear();
    Ok(Json(session).into_response())
}

/// Best-effort revoke and delete the session; the cookie is always cleared.
async fn sign_out(state: &AppState, headers: &HeaderMap, jar: CookieJar) -> Response {
    if let Some(token) = session_token(headers) {
        match state.sessions.find_session(&token).await {
            Ok(Some(session)) => {
                if let Some(discord) = session.provider_tokens.get(DISCORD_PROVIDER) {
                    state.discord.revoke_token(&discord.access_token).await;
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "session lookup failed during sign-out"),
        }
        if let Err(e) = state.sessions.delete_session(&token).await {
            warn!(error = %e, "failed to delete session on sign-out");
        }
    }
    let jar = jar.add(clear_session_cookie(state.config.secure_origin()));
    (jar, Json(SuccessResponse { success: true })).into_response()
}
