//! API server configuration.

use peachy_core::discord::{DEFAULT_SCOPES, DISCORD_API_URL};

/// Local fallback origin when neither `APP_URL` nor `VERCEL_URL` is set.
const LOCAL_APP_URL: &str = "http://localhost:3000";

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3000").
    pub bind_addr: String,
    /// PostgreSQL connection URL. `None` selects the in-memory session store.
    pub database_url: Option<String>,
    /// Discord OAuth2 application id.
    pub client_id: String,
    /// Discord OAuth2 application secret.
    pub client_secret: String,
    /// Absolute public base URL of the app, without trailing slash.
    pub app_url: String,
    /// Absolute base URL of the session auth routes, without trailing slash.
    pub auth_url: String,
    /// Origin allowed by CORS on the generic auth handler.
    pub cors_origin: String,
    /// Production mode: `ts-token` is marked `Secure`.
    pub production: bool,
    /// Discord REST base URL.
    pub discord_api_url: String,
    /// OAuth scopes requested at login.
    pub scopes: Vec<String>,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable            | Default                                   |
    /// |---------------------|-------------------------------------------|
    /// | `BIND_ADDR`         | `127.0.0.1:3000`                          |
    /// | `DATABASE_URL`      | unset (in-memory sessions)                |
    /// | `BOT_CLIENT_ID`     | empty                                     |
    /// | `BOT_CLIENT_SECRET` | empty                                     |
    /// | `APP_URL`           | `https://$VERCEL_URL`, else localhost     |
    /// | `BETTER_AUTH_URL`   | app URL                                   |
    /// | `NODE_ENV`          | `production` enables secure cookies       |
    /// | `DISCORD_API_URL`   | `https://discord.com/api/v10`             |
    /// | `DISCORD_SCOPES`    | `identify email guilds`                   |
    pub fn from_env() -> Self {
        let app_url = env_var("APP_URL");
        let vercel_url = env_var("VERCEL_URL");
        let resolved_app_url = resolve_app_url(app_url.as_deref(), vercel_url.as_deref());
        let auth_url = env_var("BETTER_AUTH_URL")
            .map(|u| trim_url(&u))
            .unwrap_or_else(|| resolved_app_url.clone());

        Self {
            bind_addr: env_var("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".into()),
            database_url: env_var("DATABASE_URL"),
            client_id: env_var("BOT_CLIENT_ID").unwrap_or_default(),
            client_secret: env_var("BOT_CLIENT_SECRET").unwrap_or_default(),
            cors_origin: resolve_cors_origin(vercel_url.as_deref(), app_url.as_deref()),
            app_url: resolved_app_url,
            auth_url,
            production: env_var("NODE_ENV").is_some_and(|v| v == "production"),
            discord_api_url: env_var("DISCORD_API_URL")
                .unwrap_or_else(|| DISCORD_API_URL.into()),
            scopes: env_var("DISCORD_SCOPES")
                .map(|s| peachy_core::auth::scopes::split_scopes(&s))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(default_scopes),
        }
    }

    /// Redirect URI registered for the cookie login flow.
    pub fn callback_redirect_uri(&self) -> String {
        format!("{}/api/auth/callback", self.app_url)
    }

    /// Redirect URI registered for the database-session sign-in flow.
    pub fn social_redirect_uri(&self) -> String {
        format!("{}/api/auth/callback/discord", self.auth_url)
    }

    /// Absolute app URL for an app-relative path.
    pub fn app_link(&self, path: &str) -> String {
        format!("{}{path}", self.app_url)
    }

    /// Login page URL, optionally carrying an error marker.
    pub fn login_url(&self, error: Option<&str>) -> String {
        match error {
            Some(code) => self.app_link(&format!("/login?error={code}")),
            None => self.app_link("/login"),
        }
    }

    /// Whether the app is served over https. Drives session cookie flags.
    pub fn secure_origin(&self) -> bool {
        self.app_url.starts_with("https://")
    }
}

pub fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

/// `APP_URL`, else `https://$VERCEL_URL`, else localhost.
pub fn resolve_app_url(app_url: Option<&str>, vercel_url: Option<&str>) -> String {
    app_url
        .map(trim_url)
        .or_else(|| vercel_url.map(vercel_origin))
        .unwrap_or_else(|| LOCAL_APP_URL.into())
}

/// `https://$VERCEL_URL`, else `APP_URL`, else localhost.
pub fn resolve_cors_origin(vercel_url: Option<&str>, app_url: Option<&str>) -> String {
    vercel_url
        .map(vercel_origin)
        .or_else(|| app_url.map(trim_url))
        .unwrap_or_else(|| LOCAL_APP_URL.into())
}

fn vercel_origin(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
