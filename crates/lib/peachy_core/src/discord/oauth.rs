//! Discord OAuth2: authorize URL, code exchange, refresh and revocation.

use tracing::{debug, warn};
use url::Url;

use super::{DiscordClient, DiscordError, check_status};
use crate::models::auth::AccessToken;

impl DiscordClient {
    /// Build the browser authorize URL.
    pub fn authorize_url(
        &self,
        redirect_uri: &str,
        scopes: &[String],
        state: Option<&str>,
    ) -> Result<String, DiscordError> {
        let mut url = Url::parse(&self.authorize_url)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.credentials.client_id)
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", &scopes.join(" "));
            if let Some(state) = state {
                query.append_pair("state", state);
            }
        }
        Ok(url.into())
    }

    /// Exchange an authorization code for a token pair.
    ///
    /// `redirect_uri` must be byte-identical to the one sent to the
    /// authorize endpoint or Discord answers `400 invalid_grant`.
    pub async fn exchange_token(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<AccessToken, DiscordError> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];
        self.token_request("token exchange", &params).await
    }

    /// Exchange a refresh token for a fresh token pair.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<AccessToken, DiscordError> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        self.token_request("token refresh", &params).await
    }

    async fn token_request(
        &self,
        endpoint: &'static str,
        params: &[(&str, &str)],
    ) -> Result<AccessToken, DiscordError> {
        let resp = self
            .http
            .post(self.endpoint("/oauth2/token"))
            .form(params)
            .send()
            .await?;
        let resp = check_status(endpoint, resp).await?;
        let token = resp
            .json::<AccessToken>()
            .await
            .map_err(|e| DiscordError::Parse(e.to_string()))?;
        debug!(endpoint, expires_in = token.expires_in, "Discord token issued");
        Ok(token)
    }

    /// Revoke a token. Best effort: failures are logged and swallowed.
    pub async fn revoke_token(&self, token: &str) {
        if let Err(e) = self.try_revoke_token(token).await {
            warn!(error = %e, "Discord token revocation failed");
        }
    }

    /// Revoke a token, surfacing failures.
    pub async fn try_revoke_token(&self, token: &str) -> Result<(), DiscordError> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("token", token),
            ("token_type_hint", "access_token"),
        ];
        let resp = self
            .http
            .post(self.endpoint("/oauth2/token/revoke"))
            .form(&params)
            .send()
            .await?;
        check_status("token revoke", resp).await?;
        debug!("Discord token revoked");
        Ok(())
    }
}
