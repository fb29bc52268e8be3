//! Data models mapping database rows and wire payloads.

pub mod api_key;
pub mod billing_event;
pub mod entitlement;
pub mod play;
pub mod signal;
pub mod usage;
