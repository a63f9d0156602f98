//! Request middleware.

pub mod cors;
pub mod session;
