//! Provider access tokens read from stored accounts.

use chrono::Utc;
use tracing::{debug, info, warn};

use super::{AccountLookup, SessionError, SessionStore};
use crate::discord::DiscordClient;
use crate::models::auth::DISCORD_PROVIDER;
use crate::models::auth::ProviderToken;

/// Resolve a usable access token for `lookup` from the store.
///
/// An expired Discord token with a refresh token is refreshed and the new
/// pair persisted. Returns `None` when no account or no usable token exists.
pub async fn fetch_access_token(
    store: &dyn SessionStore,
    discord: &DiscordClient,
    lookup: &AccountLookup,
) -> Result<Option<ProviderToken>, SessionError> {
    let Some(account) = store.find_account(lookup).await? else {
        debug!(provider_id = %lookup.provider_id, user_id = %lookup.user_id, "no linked account");
        return Ok(None);
    };
    let Some(token) = account.token else {
        return Ok(None);
    };
    if !token.is_expired() {
        return Ok(Some(token));
    }

    let refresh_token = match token.refresh_token.as_deref() {
        Some(rt) if account.provider_id == DISCORD_PROVIDER => rt.to_string(),
        _ => {
            debug!(account_id = %account.id, "stored token expired and cannot be refreshed");
            return Ok(None);
        }
    };

    match discord.refresh_token(&refresh_token).await {
        Ok(fresh) => {
            let mut refreshed = fresh.to_provider_token(Some(Utc::now()));
            if refreshed.refresh_token.is_none() {
                refreshed.refresh_token = Some(refresh_token);
            }
            store.update_account_token(&account.id, &refreshed).await?;
            info!(account_id = %account.id, "refreshed Discord access token");
            Ok(Some(refreshed))
        }
        Err(e) => {
            warn!(account_id = %account.id, error = %e, "Discord token refresh failed");
            Ok(None)
        }
    }
}
