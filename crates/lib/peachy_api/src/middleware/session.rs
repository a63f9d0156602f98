//! Session middleware: resolve the database session from the request.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use peachy_core::models::auth::Session;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::services::cookies::session_token_from_jar;

/// Key used to store the resolved `Session` in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession(pub Session);

/// Opaque session token from the session cookie, else `Authorization: Bearer`.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    session_token_from_jar(&jar).or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
    })
}

/// Look up the live session for these headers.
pub async fn resolve_session(state: &AppState, headers: &HeaderMap) -> AppResult<Option<Session>> {
    let Some(token) = session_token(headers) else {
        return Ok(None);
    };
    let session = state.sessions.find_session(&token).await?;
    if session.is_none() {
        debug!("session token presented but no live session");
    }
    Ok(session)
}

/// Axum middleware: resolves the session and injects `AuthenticatedSession`
/// into request extensions. Responds 401 when there is none.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = resolve_session(&state, request.headers())
        .await?
        .ok_or_else(|| AppError::Unauthorized("No active session".into()))?;

    request
        .extensions_mut()
        .insert(AuthenticatedSession(session));

    Ok(next.run(request).await)
}
