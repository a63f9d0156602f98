//! Read-only Discord user endpoints.

use serde::de::DeserializeOwned;

use super::{DiscordClient, DiscordError, check_status};
use crate::models::discord::{DiscordUser, Guild};

impl DiscordClient {
    /// `GET /users/@me`
    pub async fn current_user(&self, access_token: &str) -> Result<DiscordUser, DiscordError> {
        self.get_json("current user", "/users/@me", access_token)
            .await
    }

    /// `GET /users/@me/guilds`
    pub async fn current_user_guilds(&self, access_token: &str) -> Result<Vec<Guild>, DiscordError> {
        self.get_json("current user guilds", "/users/@me/guilds", access_token)
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        access_token: &str,
    ) -> Result<T, DiscordError> {
        let resp = self
            .http
            .get(self.endpoint(path))
            .bearer_auth(access_token)
            .send()
            .await?;
        let resp = check_status(endpoint, resp).await?;
        resp.json::<T>()
            .await
            .map_err(|e| DiscordError::Parse(format!("{endpoint}: {e}")))
    }
}
