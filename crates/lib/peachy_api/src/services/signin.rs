//! Database-session sign-in with Discord.

use std::collections::BTreeMap;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info};

use peachy_core::discord::DiscordError;
use peachy_core::models::auth::{DISCORD_PROVIDER, Session};
use peachy_core::session::{LinkedAccount, default_expiry};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{SocialSignInParams, SocialSignInResponse};

/// Landing path after sign-in when none is requested.
pub const DEFAULT_CALLBACK_PATH: &str = "/dashboard";

/// Sign-in callback failures, each mapped to a login-page error marker.
#[derive(Debug, Error)]
pub enum SignInError {
    #[error("unknown or expired sign-in state")]
    InvalidState,

    #[error("token exchange rejected: {0}")]
    TokenExchange(DiscordError),

    #[error("sign-in failed: {0}")]
    Server(String),
}

impl SignInError {
    /// Marker placed in `/login?error=`.
    pub fn code(&self) -> &'static str {
        match self {
            SignInError::InvalidState => "invalid_state",
            SignInError::TokenExchange(_) => "token_exchange",
            SignInError::Server(_) => "server_error",
        }
    }
}

/// Reduce a requested callback to an app-relative path.
///
/// Absolute URLs are accepted only on the app's own origin; anything else
/// falls back to [`DEFAULT_CALLBACK_PATH`].
pub fn sanitize_callback(app_url: &str, requested: Option<&str>) -> String {
    let Some(raw) = requested.map(str::trim).filter(|r| !r.is_empty()) else {
        return DEFAULT_CALLBACK_PATH.into();
    };
    let path = raw.strip_prefix(app_url).unwrap_or(raw);
    if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') {
        path.to_string()
    } else {
        DEFAULT_CALLBACK_PATH.into()
    }
}

/// Start a Discord sign-in: remember a CSRF state and return the authorize URL.
pub fn start_social_sign_in(
    state: &AppState,
    params: &SocialSignInParams,
) -> AppResult<SocialSignInResponse> {
    let provider = params.provider.as_deref().unwrap_or(DISCORD_PROVIDER);
    if !provider.eq_ignore_ascii_case(DISCORD_PROVIDER) {
        return Err(AppError::Validation(format!(
            "Unsupported provider '{provider}'"
        )));
    }

    let callback_path = sanitize_callback(&state.config.app_url, params.callback_url.as_deref());
    let csrf = state.sign_in_states.begin(DISCORD_PROVIDER, callback_path);
    let url = state.discord.authorize_url(
        &state.config.social_redirect_uri(),
        &state.config.scopes,
        Some(&csrf),
    )?;

    Ok(SocialSignInResponse {
        url,
        redirect: true,
    })
}

/// Finish a Discord sign-in: exchange the code, link the account, open a
/// session. Returns the session and the path to land on.
pub async fn complete_discord_sign_in(
    state: &AppState,
    code: &str,
    csrf: &str,
) -> Result<(Session, String), SignInError> {
    let pending = state
        .sign_in_states
        .complete(csrf)
        .filter(|p| p.provider_id == DISCORD_PROVIDER)
        .ok_or(SignInError::InvalidState)?;

    let issued_at = Utc::now();
    let token = state
        .discord
        .exchange_token(code, &state.config.social_redirect_uri())
        .await
        .map_err(|e| match e {
            DiscordError::Http { .. } => SignInError::TokenExchange(e),
            other => SignInError::Server(other.to_string()),
        })?;
    let provider_token = token.to_provider_token(Some(issued_at));

    let user = state
        .discord
        .current_user(&token.access_token)
        .await
        .map_err(|e| SignInError::Server(format!("fetch Discord user: {e}")))?;

    let user_id = state
        .sessions
        .upsert_account(&LinkedAccount {
            provider_id: DISCORD_PROVIDER.into(),
            account_id: user.id.clone(),
            name: user.display_name().to_string(),
            email: user.email.clone(),
            image: user.avatar_url(),
            token: provider_token.clone(),
        })
        .await
        .map_err(|e| SignInError::Server(format!("link account: {e}")))?;

    let session = state
        .sessions
        .create_session(
            &user_id,
            BTreeMap::from([(DISCORD_PROVIDER.to_string(), provider_token)]),
            default_expiry(Utc::now()),
        )
        .await
        .map_err(|e| {
            error!(user_id = %user_id, error = %e, "session creation failed");
            SignInError::Server(format!("create session: {e}"))
        })?;

    info!(user_id = %user_id, discord_id = %user.id, "signed in with Discord");
    Ok((session, pending.callback_path))
}
