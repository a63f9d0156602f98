//! Token accessor: the Discord token behind a session.
//!
//! Embedded session tokens are tried first; the stored account is the
//! fallback and is refreshed when expired.

use peachy_core::auth::extract::extract_provider_token;
use peachy_core::models::auth::{DISCORD_PROVIDER, ProviderToken, Session};
use peachy_core::session::AccountLookup;
use peachy_core::session::access::fetch_access_token;
use tracing::{debug, warn};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::AccessTokenParams;

/// Resolve the provider token for `session`, honouring the optional
/// provider/account/user overrides in `params`.
pub async fn resolve_provider_token(
    state: &AppState,
    session: &Session,
    params: &AccessTokenParams,
) -> AppResult<ProviderToken> {
    let provider_id = params
        .provider_id
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DISCORD_PROVIDER)
        .to_ascii_lowercase();

    // Tokens are only ever handed out for the session's own user.
    if let Some(user_id) = params.user_id.as_deref()
        && user_id != session.user.id
    {
        warn!(session_user = %session.user.id, requested_user = %user_id, "access token requested for another user");
        return Err(not_found(&provider_id));
    }

    if params.account_id.is_none() {
        let value = serde_json::to_value(session)
            .map_err(|e| AppError::Internal(format!("serialize session: {e}")))?;
        match extract_provider_token(&value, &provider_id) {
            Some(token) if !token.is_expired() => {
                debug!(provider_id = %provider_id, "using token embedded in session");
                return Ok(token);
            }
            Some(_) => debug!(provider_id = %provider_id, "embedded token expired, fetching"),
            None => debug!(provider_id = %provider_id, "no embedded token, fetching"),
        }
    }

    let lookup = AccountLookup {
        provider_id: provider_id.clone(),
        user_id: session.user.id.clone(),
        account_id: params.account_id.clone(),
    };
    fetch_access_token(state.sessions.as_ref(), &state.discord, &lookup)
        .await?
        .ok_or_else(|| not_found(&provider_id))
}

fn not_found(provider_id: &str) -> AppError {
    AppError::NotFound(format!("No {provider_id} access token for this session"))
}
