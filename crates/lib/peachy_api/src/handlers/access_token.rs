//! `get-access-token`: the provider token behind the current session.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::Uri;

use peachy_core::models::auth::ProviderToken;

use super::request_params;
use crate::AppState;
use crate::error::AppResult;
use crate::middleware::session::AuthenticatedSession;
use crate::models::AccessTokenParams;
use crate::services::access::resolve_provider_token;

/// `GET /api/auth/get-access-token?providerId=&accountId=&userId=`
pub async fn get_access_token_handler(
    State(state): State<AppState>,
    axum::Extension(session): axum::Extension<AuthenticatedSession>,
    uri: Uri,
) -> AppResult<Json<ProviderToken>> {
    let params: AccessTokenParams = request_params(&uri, &[])?;
    let token = resolve_provider_token(&state, &session.0, &params).await?;
    Ok(Json(token))
}

/// `POST /api/auth/get-access-token`: same parameters as a JSON body.
pub async fn post_access_token_handler(
    State(state): State<AppState>,
    axum::Extension(session): axum::Extension<AuthenticatedSession>,
    uri: Uri,
    body: Bytes,
) -> AppResult<Json<ProviderToken>> {
    let params: AccessTokenParams = request_params(&uri, &body)?;
    let token = resolve_provider_token(&state, &session.0, &params).await?;
    Ok(Json(token))
}
