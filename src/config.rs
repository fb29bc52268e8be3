//! Application configuration management.
//!
//! Configuration comes from environment variables, deserialized with the
//! `envy` crate into a type-safe struct. Only `DATABASE_URL` and
//! `BILLING_WEBHOOK_SECRET` are required; everything else has a default.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `BILLING_WEBHOOK_SECRET` (required): HMAC secret shared with the
///   payment processor for webhook signature verification
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `FREE_DAILY_LIMIT` (optional): daily gateway requests for free teams,
///   defaults to 100
/// - `PREMIUM_DAILY_LIMIT` (optional): daily requests for premium teams,
///   defaults to 10000
/// - `MAX_BODY_BYTES` (optional): request body cap, defaults to 102400
/// - `WEBHOOK_TOLERANCE_SECS` (optional): accepted signature timestamp
///   skew, defaults to 300
/// - `STRICT_QUOTA` (optional): use the atomic counter instead of the
///   ledger count for quota enforcement, defaults to false
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    pub billing_webhook_secret: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_free_daily_limit")]
    pub free_daily_limit: i64,

    #[serde(default = "default_premium_daily_limit")]
    pub premium_daily_limit: i64,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default = "default_webhook_tolerance_secs")]
    pub webhook_tolerance_secs: i64,

    #[serde(default)]
    pub strict_quota: bool,
}

fn default_port() -> u16 {
    3000
}

fn default_free_daily_limit() -> i64 {
    100
}

fn default_premium_daily_limit() -> i64 {
    10_000
}

fn default_max_body_bytes() -> usize {
    100 * 1024
}

fn default_webhook_tolerance_secs() -> i64 {
    300
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Attempts to load a `.env` file first (optional), then
    /// deserializes the environment. Field names map to upper-case
    /// variable names (`database_url` -> `DATABASE_URL`).
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>()
    }

    /// Daily request limit for a team, by entitlement tier.
    pub fn daily_limit(&self, premium: bool) -> i64 {
        if premium {
            self.premium_daily_limit
        } else {
            self.free_daily_limit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/test".into(),
            billing_webhook_secret: "whsec_test".into(),
            server_port: default_port(),
            free_daily_limit: default_free_daily_limit(),
            premium_daily_limit: default_premium_daily_limit(),
            max_body_bytes: default_max_body_bytes(),
            webhook_tolerance_secs: default_webhook_tolerance_secs(),
            strict_quota: false,
        }
    }

    #[test]
    fn daily_limit_follows_tier() {
        let config = test_config();
        assert_eq!(config.daily_limit(false), 100);
        assert_eq!(config.daily_limit(true), 10_000);
    }
}
