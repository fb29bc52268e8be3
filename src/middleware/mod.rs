//! Gateway middleware: authentication, quota enforcement, usage logging.

pub mod auth;
pub mod quota;
pub mod usage;
