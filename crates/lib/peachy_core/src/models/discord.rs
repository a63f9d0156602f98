//! Read-only Discord entities.
//!
//! These are owned by Discord; the application only derives display state
//! from them.

use serde::{Deserialize, Serialize};

/// Discord CDN root for avatars and guild icons.
pub const DISCORD_CDN_URL: &str = "https://cdn.discordapp.com";

/// `MANAGE_GUILD` permission bit.
pub const MANAGE_GUILD: u64 = 1 << 5;

/// `ADMINISTRATOR` permission bit.
pub const ADMINISTRATOR: u64 = 1 << 3;

/// `GET /users/@me` payload (subset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
}

impl DiscordUser {
    /// Global display name when set, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.global_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }

    pub fn avatar_url(&self) -> Option<String> {
        let hash = self.avatar.as_deref()?;
        let ext = if hash.starts_with("a_") { "gif" } else { "png" };
        Some(format!("{DISCORD_CDN_URL}/avatars/{}/{hash}.{ext}", self.id))
    }
}

/// Partial guild from `GET /users/@me/guilds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub owner: bool,
    /// Permission bitset, serialized by Discord as a decimal string.
    #[serde(default)]
    pub permissions: String,
}

impl Guild {
    pub fn icon_url(&self) -> Option<String> {
        let hash = self.icon.as_deref()?;
        let ext = if hash.starts_with("a_") { "gif" } else { "png" };
        Some(format!("{DISCORD_CDN_URL}/icons/{}/{hash}.{ext}", self.id))
    }

    pub fn permission_bits(&self) -> u64 {
        self.permissions.parse().unwrap_or(0)
    }

    /// Whether the current user may configure this guild on the dashboard.
    pub fn manageable(&self) -> bool {
        let bits = self.permission_bits();
        self.owner || bits & (MANAGE_GUILD | ADMINISTRATOR) != 0
    }
}
