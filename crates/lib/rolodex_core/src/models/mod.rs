//! Domain models shared by the core and the HTTP layer.

pub mod auth;
pub mod contact;
