//! Authentication domain models.
//!
//! `AccessToken` mirrors the provider's token endpoint payload (snake_case on
//! the wire). `ProviderToken` and `Session` are this application's own shapes
//! and serialize as camelCase.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::scopes::split_scopes;

/// Provider id used for Discord accounts and embedded tokens.
pub const DISCORD_PROVIDER: &str = "discord";

/// Token pair returned by the provider's token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
    /// Lifetime in seconds, counted from issuance.
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub scope: String,
}

fn bearer() -> String {
    "Bearer".to_string()
}

impl AccessToken {
    /// Absolute expiry for a token issued at `issued_at`, or `None` when
    /// `expires_in` does not fit the representable time range.
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        Duration::try_seconds(self.expires_in).and_then(|d| issued_at.checked_add_signed(d))
    }

    /// Normalize into a [`ProviderToken`].
    ///
    /// Without an issuance time the absolute expiry is unknown and left empty.
    pub fn to_provider_token(&self, issued_at: Option<DateTime<Utc>>) -> ProviderToken {
        ProviderToken {
            access_token: self.access_token.clone(),
            refresh_token: Some(self.refresh_token.clone()).filter(|t| !t.is_empty()),
            expires_at: issued_at.and_then(|at| self.expires_at(at)),
            scopes: split_scopes(&self.scope),
        }
    }
}

/// Normalized token for one external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl ProviderToken {
    /// Whether the token is past its expiry at `now`. Tokens without a known
    /// expiry are never considered expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Space-delimited scope string, as stored on account rows.
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Authenticated user as exposed on a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Database-backed session.
///
/// `token` is the opaque value presented in the session cookie; only its hash
/// is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user: SessionUser,
    pub expires_at: DateTime<Utc>,
    pub token: String,
    /// Provider tokens embedded at sign-in, keyed by provider id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub provider_tokens: BTreeMap<String, ProviderToken>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
