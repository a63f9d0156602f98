//! Discord REST client.
//!
//! Covers the OAuth2 endpoints (authorize URL, code exchange, refresh,
//! revocation) and the two read-only user endpoints the dashboard needs.

pub mod api;
pub mod oauth;

use thiserror::Error;

/// Default Discord REST base URL.
pub const DISCORD_API_URL: &str = "https://discord.com/api/v10";

/// Discord's browser-facing authorize endpoint.
pub const DISCORD_AUTHORIZE_URL: &str = "https://discord.com/oauth2/authorize";

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: &[&str] = &["identify", "email", "guilds"];

/// Discord client errors.
#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("Discord request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Discord {endpoint} HTTP {status}: {body}")]
    Http {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("Discord response parse error: {0}")]
    Parse(String),

    #[error("Invalid Discord URL: {0}")]
    Url(#[from] url::ParseError),
}

impl DiscordError {
    /// HTTP status returned by Discord, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            DiscordError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether Discord rejected the credentials (401).
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// OAuth2 application credentials.
#[derive(Clone)]
pub struct DiscordCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for DiscordCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Discord REST client. Cheap to clone; the inner `reqwest::Client` is shared.
#[derive(Debug, Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    api_base: String,
    authorize_url: String,
    credentials: DiscordCredentials,
}

impl DiscordClient {
    /// Client against the public Discord API.
    pub fn new(credentials: DiscordCredentials) -> Self {
        Self::with_base_url(credentials, DISCORD_API_URL)
    }

    /// Client against a custom REST base (tests, proxies).
    pub fn with_base_url(credentials: DiscordCredentials, api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            authorize_url: DISCORD_AUTHORIZE_URL.to_string(),
            credentials,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }
}

/// Turn a non-2xx response into [`DiscordError::Http`], keeping the body.
async fn check_status(
    endpoint: &'static str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, DiscordError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(DiscordError::Http {
        endpoint,
        status,
        body,
    })
}
