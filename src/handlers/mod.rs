//! HTTP route handlers.

pub mod admin;
pub mod entitlements;
pub mod health;
pub mod plays;
pub mod signals;
pub mod webhooks;
