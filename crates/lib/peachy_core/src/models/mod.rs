//! Domain models shared by the API layer and the session stores.

pub mod auth;
pub mod discord;
