//! Business logic services shared by handlers and middleware.

pub mod entitlement_service;
pub mod usage_service;
pub mod webhook_service;
