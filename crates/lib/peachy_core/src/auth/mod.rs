//! Authentication helpers independent of any HTTP framework.
//!
//! Scope coercion, provider-token extraction from loosely shaped session
//! payloads, opaque session-token generation, and the pending sign-in state
//! store used for CSRF protection of the OAuth round trip.

pub mod extract;
pub mod scopes;
pub mod state;
pub mod tokens;
