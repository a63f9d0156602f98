//! Opaque session tokens.
//!
//! The plaintext token only ever lives in the client cookie; stores persist
//! its SHA-256 hash.

use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use sha2::{Digest, Sha256};

/// Length of generated session tokens.
const SESSION_TOKEN_LEN: usize = 64;

/// Generate a cryptographically random session token (64 alphanumeric chars).
pub fn generate_session_token() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// SHA-256 hash a session token for storage.
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
