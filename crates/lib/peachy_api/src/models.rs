//! Request and response bodies.
//!
//! Wire shapes are camelCase to match the browser client.

use serde::{Deserialize, Serialize};

use peachy_core::models::discord::{DiscordUser, Guild};

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Parameters of `get-access-token`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenParams {
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl AccessTokenParams {
    pub fn is_empty(&self) -> bool {
        self.provider_id.is_none() && self.account_id.is_none() && self.user_id.is_none()
    }
}

/// Parameters of `sign-in/social`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialSignInParams {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default, rename = "callbackURL", alias = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// Query of the OAuth callbacks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Response of `sign-in/social`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialSignInResponse {
    pub url: String,
    pub redirect: bool,
}

/// `{ "success": true }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// `{ "ok": true }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Discord user as served to the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordUserResponse {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl From<DiscordUser> for DiscordUserResponse {
    fn from(user: DiscordUser) -> Self {
        Self {
            display_name: user.display_name().to_string(),
            avatar_url: user.avatar_url(),
            id: user.id,
            username: user.username,
        }
    }
}

/// Guild with derived display state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildResponse {
    pub id: String,
    pub name: String,
    pub icon_url: Option<String>,
    pub owner: bool,
    pub manageable: bool,
}

impl From<Guild> for GuildResponse {
    fn from(guild: Guild) -> Self {
        Self {
            icon_url: guild.icon_url(),
            manageable: guild.manageable(),
            owner: guild.owner,
            id: guild.id,
            name: guild.name,
        }
    }
}
