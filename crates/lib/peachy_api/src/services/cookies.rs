//! Cookie service: build and clear the token and session cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use time::Duration;

use peachy_core::models::auth::AccessToken;

/// Cookie holding the JSON-serialized Discord token pair.
pub const TOKEN_COOKIE: &str = "ts-token";
/// Cookie holding the opaque database session token.
pub const SESSION_COOKIE: &str = "better-auth.session_token";
/// Name browsers use for the session cookie on secure origins.
pub const SECURE_SESSION_COOKIE: &str = "__Secure-better-auth.session_token";

/// `ts-token` lifetime: 30 days.
const TOKEN_COOKIE_DAYS: i64 = 30;

/// Build the `ts-token` cookie. Readable by client script.
pub fn token_cookie(token: &AccessToken, secure: bool) -> Result<Cookie<'static>, serde_json::Error> {
    let value = serde_json::to_string(token)?;
    Ok(Cookie::build((TOKEN_COOKIE, value))
        .http_only(false)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::days(TOKEN_COOKIE_DAYS))
        .build())
}

/// Expired `ts-token` to clear the cookie flow.
pub fn clear_token_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, ""))
        .http_only(false)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Parse the `ts-token` cookie, if present.
///
/// `None` when absent, `Some(Err)` when present but not a token payload.
pub fn read_token_cookie(jar: &CookieJar) -> Option<Result<AccessToken, serde_json::Error>> {
    jar.get(TOKEN_COOKIE)
        .map(|c| serde_json::from_str::<AccessToken>(c.value()))
}

fn session_same_site(secure_origin: bool) -> SameSite {
    if secure_origin {
        SameSite::None
    } else {
        SameSite::Lax
    }
}

/// Build the httpOnly session cookie, expiring with the session.
pub fn session_cookie(
    token: &str,
    expires_at: DateTime<Utc>,
    secure_origin: bool,
) -> Cookie<'static> {
    let max_age = (expires_at - Utc::now()).num_seconds().max(0);
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .http_only(true)
        .secure(secure_origin)
        .same_site(session_same_site(secure_origin))
        .path("/")
        .max_age(Duration::seconds(max_age))
        .build()
}

/// Expired session cookie.
pub fn clear_session_cookie(secure_origin: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .secure(secure_origin)
        .same_site(session_same_site(secure_origin))
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Session token from either cookie name.
pub fn session_token_from_jar(jar: &CookieJar) -> Option<String> {
    [SESSION_COOKIE, SECURE_SESSION_COOKIE]
        .iter()
        .filter_map(|name| jar.get(name))
        .map(|c| c.value().trim().to_string())
        .find(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> AccessToken {
        AccessToken {
            access_token: "at".into(),
            token_type: "Bearer".into(),
            expires_in: 604800,
            refresh_token: "rt".into(),
            scope: "identify guilds".into(),
        }
    }

    #[test]
    fn token_cookie_attributes() {
        let cookie = token_cookie(&token(), true).unwrap();
        assert_eq!(cookie.name(), TOKEN_COOKIE);
        assert_eq!(cookie.http_only(), Some(false));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(30)));
        let parsed: AccessToken = serde_json::from_str(cookie.value()).unwrap();
        assert_eq!(parsed, token());
    }

    #[test]
    fn token_cookie_round_trips_through_jar() {
        let jar = CookieJar::new().add(token_cookie(&token(), false).unwrap());
        let parsed = read_token_cookie(&jar).unwrap().unwrap();
        assert_eq!(parsed.access_token, "at");

        let jar = CookieJar::new().add(Cookie::new(TOKEN_COOKIE, "not json"));
        assert!(read_token_cookie(&jar).unwrap().is_err());
        assert!(read_token_cookie(&CookieJar::new()).is_none());
    }

    #[test]
    fn session_cookie_same_site_follows_origin() {
        let expires = Utc::now() + chrono::Duration::days(7);
        let secure = session_cookie("tok", expires, true);
        assert_eq!(secure.http_only(), Some(true));
        assert_eq!(secure.secure(), Some(true));
        assert_eq!(secure.same_site(), Some(SameSite::None));

        let local = session_cookie("tok", expires, false);
        assert_eq!(local.secure(), Some(false));
        assert_eq!(local.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn clear_cookies_expire_immediately() {
        assert_eq!(clear_token_cookie(false).max_age(), Some(Duration::ZERO));
        assert_eq!(clear_session_cookie(false).max_age(), Some(Duration::ZERO));
    }

    #[test]
    fn session_token_from_either_name() {
        let jar = CookieJar::new().add(Cookie::new(SECURE_SESSION_COOKIE, "abc"));
        assert_eq!(session_token_from_jar(&jar).as_deref(), Some("abc"));
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, " "));
        assert!(session_token_from_jar(&jar).is_none());
    }
}
