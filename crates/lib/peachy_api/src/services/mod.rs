//! Services shared by handlers.

pub mod access;
pub mod cookies;
pub mod signin;
