//! Provider-token extraction from session payloads.
//!
//! Sessions produced by different auth-library versions embed provider
//! tokens under different paths and key casings. The extractor walks the
//! known shapes and normalizes whatever it finds into a [`ProviderToken`].
//! This process itself writes `providerTokens.discord` with camelCase keys.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use super::scopes::coerce_scopes;
use crate::models::auth::{DISCORD_PROVIDER, ProviderToken};

/// Keys that may hold the provider-token map.
const CONTAINER_KEYS: &[&str] = &["providerTokens", "provider_tokens"];

/// Objects (relative to the root) that may hold a provider-token map.
const PARENT_KEYS: &[&str] = &["session", "data"];

/// Epoch values above this are treated as milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Extract the Discord token from a session payload.
pub fn extract_discord_token_from_session(session: &Value) -> Option<ProviderToken> {
    extract_provider_token(session, DISCORD_PROVIDER)
}

/// Extract the token for `provider_id` from any known session shape.
///
/// Returns `None` when no shape holds a token with a non-empty access token.
pub fn extract_provider_token(session: &Value, provider_id: &str) -> Option<ProviderToken> {
    let root = session.as_object()?;
    let parents = std::iter::once(root).chain(
        PARENT_KEYS
            .iter()
            .filter_map(|key| root.get(*key).and_then(Value::as_object)),
    );

    for parent in parents {
        for container_key in CONTAINER_KEYS {
            let Some(container) = parent.get(*container_key).and_then(Value::as_object) else {
                continue;
            };
            if let Some(token) = lookup_provider(container, provider_id).and_then(normalize_token)
            {
                return Some(token);
            }
        }
    }
    None
}

/// Case-insensitive provider lookup, preferring an exact key match.
fn lookup_provider<'a>(container: &'a Map<String, Value>, provider_id: &str) -> Option<&'a Value> {
    container.get(provider_id).or_else(|| {
        container
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(provider_id))
            .map(|(_, value)| value)
    })
}

fn normalize_token(value: &Value) -> Option<ProviderToken> {
    if let Some(raw) = value.as_str() {
        return non_empty(raw).map(|access_token| ProviderToken {
            access_token,
            refresh_token: None,
            expires_at: None,
            scopes: Vec::new(),
        });
    }

    let obj = value.as_object()?;
    let access_token = first_str(obj, &["accessToken", "access_token"])?;
    let refresh_token = first_str(obj, &["refreshToken", "refresh_token"]);
    let expires_at = ["expiresAt", "expires_at", "accessTokenExpiresAt"]
        .iter()
        .filter_map(|key| obj.get(*key))
        .find_map(parse_timestamp);
    let scopes = ["scopes", "scope"]
        .iter()
        .filter_map(|key| obj.get(*key))
        .map(coerce_scopes)
        .find(|s| !s.is_empty())
        .unwrap_or_default();

    Some(ProviderToken {
        access_token,
        refresh_token,
        expires_at,
        scopes,
    })
}

fn first_str(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .find_map(non_empty)
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse an RFC 3339 string or a unix epoch in seconds or milliseconds.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => {
            let raw = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            if raw > EPOCH_MILLIS_THRESHOLD {
                Utc.timestamp_millis_opt(raw).single()
            } else {
                Utc.timestamp_opt(raw, 0).single()
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_normalized(session: Value) {
        let token = extract_discord_token_from_session(&session)
            .unwrap_or_else(|| panic!("no token in {session}"));
        assert_eq!(token.access_token, "at-123");
        assert_eq!(token.scopes, vec!["identify", "guilds"]);
    }

    #[test]
    fn root_provider_tokens_lowercase() {
        assert_normalized(json!({
            "providerTokens": {"discord": {"accessToken": "at-123", "scopes": ["identify", "guilds"]}}
        }));
    }

    #[test]
    fn root_provider_tokens_capitalized() {
        assert_normalized(json!({
            "providerTokens": {"Discord": {"accessToken": "at-123", "scope": "identify guilds"}}
        }));
    }

    #[test]
    fn nested_session_provider_tokens() {
        assert_normalized(json!({
            "user": {"id": "u1"},
            "session": {"providerTokens": {"Discord": {"access_token": "at-123", "scope": "identify,guilds"}}}
        }));
        assert_normalized(json!({
            "session": {"provider_tokens": {"discord": {"access_token": "at-123", "scopes": "identify guilds"}}}
        }));
    }

    #[test]
    fn nested_data_provider_tokens() {
        assert_normalized(json!({
            "data": {"providerTokens": {"DISCORD": {"accessToken": "at-123", "scopes": ["identify", "guilds"]}}}
        }));
    }

    #[test]
    fn bare_string_token() {
        let token = extract_discord_token_from_session(&json!({
            "providerTokens": {"discord": "at-123"}
        }))
        .unwrap();
        assert_eq!(token.access_token, "at-123");
        assert!(token.scopes.is_empty());
    }

    #[test]
    fn refresh_and_expiry_are_normalized() {
        let token = extract_discord_token_from_session(&json!({
            "providerTokens": {"discord": {
                "accessToken": "at-123",
                "refresh_token": "rt-456",
                "expiresAt": 1_700_000_000_000i64,
                "scopes": ["identify"]
            }}
        }))
        .unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("rt-456"));
        assert_eq!(token.expires_at.unwrap().timestamp(), 1_700_000_000);

        let token = extract_discord_token_from_session(&json!({
            "providerTokens": {"discord": {
                "accessToken": "at-123",
                "accessTokenExpiresAt": "2030-01-01T00:00:00Z"
            }}
        }))
        .unwrap();
        assert_eq!(token.expires_at.unwrap().to_rfc3339(), "2030-01-01T00:00:00+00:00");

        let token = extract_discord_token_from_session(&json!({
            "providerTokens": {"discord": {"accessToken": "at-123", "expires_at": 1_700_000_000}}
        }))
        .unwrap();
        assert_eq!(token.expires_at.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn exact_key_beats_case_variant() {
        let token = extract_discord_token_from_session(&json!({
            "providerTokens": {"Discord": {"accessToken": "upper"}, "discord": {"accessToken": "lower"}}
        }))
        .unwrap();
        assert_eq!(token.access_token, "lower");
    }

    #[test]
    fn missing_shapes_return_none() {
        assert!(extract_discord_token_from_session(&json!({})).is_none());
        assert!(extract_discord_token_from_session(&json!(null)).is_none());
        assert!(
            extract_discord_token_from_session(&json!({
                "user": {"id": "u1"},
                "session": {"id": "s1"},
                "providerTokens": {"github": {"accessToken": "gh"}}
            }))
            .is_none()
        );
    }

    #[test]
    fn empty_access_token_is_rejected() {
        assert!(
            extract_discord_token_from_session(&json!({
                "providerTokens": {"discord": {"accessToken": "  ", "refreshToken": "rt"}}
            }))
            .is_none()
        );
    }

    #[test]
    fn falls_through_to_later_shape_when_first_is_invalid() {
        let token = extract_discord_token_from_session(&json!({
            "providerTokens": {"discord": {"accessToken": ""}},
            "session": {"providerTokens": {"discord": {"accessToken": "at-123"}}}
        }))
        .unwrap();
        assert_eq!(token.access_token, "at-123");
    }
}
