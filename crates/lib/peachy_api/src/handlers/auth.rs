//! Cookie login flow: login redirect, OAuth callback, sign-out and token read.
//!
//! Page-flow handlers always answer with a redirect; failures only show up
//! as an `error` marker on the login URL.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info, warn};

use peachy_core::discord::DiscordError;
use peachy_core::models::auth::ProviderToken;

use super::found;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::session::session_token;
use crate::models::CallbackParams;
use crate::services::cookies::{
    self, clear_session_cookie, clear_token_cookie, read_token_cookie, token_cookie,
};

/// `GET /api/auth/login`: redirect to Discord's authorize page.
pub async fn login_handler(State(state): State<AppState>) -> AppResult<Response> {
    let url = state.discord.authorize_url(
        &state.config.callback_redirect_uri(),
        &state.config.scopes,
        None,
    )?;
    Ok(found(url))
}

/// `GET|POST /api/auth/callback`: exchange the code and set `ts-token`.
pub async fn callback_handler(
    State(state): State<AppState>,
    uri: Uri,
    jar: CookieJar,
) -> Response {
    let config = &state.config;

    let params = match Query::<CallbackParams>::try_from_uri(&uri) {
        Ok(Query(params)) => params,
        Err(e) => {
            warn!(error = %e, "unreadable OAuth callback query");
            return found(config.login_url(Some("server_error")));
        }
    };

    if let Some(reason) = params.error.as_deref() {
        warn!(error = %reason, "Discord authorization was not granted");
        return found(config.login_url(None));
    }

    let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
        warn!("OAuth callback without code");
        return found(config.login_url(Some("no_code")));
    };

    let token = match state
        .discord
        .exchange_token(code, &config.callback_redirect_uri())
        .await
    {
        Ok(token) => token,
        Err(DiscordError::Http { status, body, .. }) => {
            error!(status, body = %body, redirect_uri = %config.callback_redirect_uri(), "token exchange rejected");
            return found(config.login_url(Some("token_exchange")));
        }
        Err(e) => {
            error!(error = %e, "token exchange failed");
            return found(config.login_url(Some("server_error")));
        }
    };

    match token_cookie(&token, config.production) {
        Ok(cookie) => {
            info!(expires_in = token.expires_in, "Discord login completed");
            (jar.add(cookie), found(config.app_link("/dashboard"))).into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to serialize token cookie");
            found(config.login_url(Some("server_error")))
        }
    }
}

/// `GET /api/auth/signout`: best-effort revoke, clear cookies, go to login.
pub async fn signout_handler(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    jar: CookieJar,
) -> Response {
    match read_token_cookie(&jar) {
        Some(Ok(token)) => state.discord.revoke_token(&token.access_token).await,
        Some(Err(e)) => warn!(error = %e, "unreadable token cookie on sign-out"),
        None => {}
    }

    let mut jar = jar.add(clear_token_cookie(state.config.production));

    if let Some(token) = session_token(&headers) {
        if let Err(e) = state.sessions.delete_session(&token).await {
            warn!(error = %e, "failed to delete session on sign-out");
        }
        jar = jar.add(clear_session_cookie(state.config.secure_origin()));
    }

    (jar, found(state.config.login_url(None))).into_response()
}

/// `GET /api/auth/token`: the `ts-token` cookie as a normalized token.
pub async fn token_handler(jar: CookieJar) -> AppResult<Json<ProviderToken>> {
    let token = read_token_cookie(&jar)
        .ok_or_else(|| AppError::Unauthorized(format!("Missing {} cookie", cookies::TOKEN_COOKIE)))?
        .map_err(|_| AppError::Validation(format!("Malformed {} cookie", cookies::TOKEN_COOKIE)))?;
    Ok(Json(token.to_provider_token(None)))
}
