//! CORS for the generic auth handler.
//!
//! Credentials are allowed, so origin, methods and headers are explicit.

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

/// Allowed request headers.
const ALLOWED_HEADERS: [HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::AUTHORIZATION,
    header::COOKIE,
    HeaderName::from_static("x-requested-with"),
];

/// Allowed methods.
const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer for `origin`.
pub fn auth_cors(origin: &str) -> CorsLayer {
    let origin = HeaderValue::from_str(origin).unwrap_or_else(|_| {
        warn!(origin = %origin, "invalid CORS origin, falling back to localhost");
        HeaderValue::from_static("http://localhost:3000")
    });
    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(ALLOWED_HEADERS)
}
