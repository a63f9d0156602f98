//! Route paths.

pub const GET_AUTH_LOGIN: &str = "/api/auth/login";
pub const AUTH_CALLBACK: &str = "/api/auth/callback";
pub const GET_AUTH_SIGNOUT: &str = "/api/auth/signout";
pub const AUTH_GET_ACCESS_TOKEN: &str = "/api/auth/get-access-token";
pub const GET_AUTH_TOKEN: &str = "/api/auth/token";
/// Generic session handler; matched after every static `/api/auth/*` route.
pub const AUTH_CATCH_ALL: &str = "/api/auth/{*rest}";

pub const GET_DISCORD_USER: &str = "/api/discord/user";
pub const GET_DISCORD_GUILDS: &str = "/api/discord/guilds";
