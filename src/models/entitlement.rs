//! Entitlement model: per-team billing state.
//!
//! One row per team. `premium` is the single flag the gateway and any
//! premium-gated handler consult; `billing_status` and `at_risk` carry the
//! finer-grained billing picture for dunning and UI messaging. The
//! invariant `premium = true implies billing_status = 'active'` is upheld
//! by only ever writing the two together through an
//! [`EntitlementTransition`](crate::services::entitlement_service).

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Billing status values stored in `entitlements.billing_status`.
pub mod billing_status {
    pub const FREE: &str = "free";
    pub const ACTIVE: &str = "active";
    pub const PAST_DUE: &str = "past_due";
}

/// Row from the `entitlements` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Entitlement {
    pub team_id: Uuid,
    pub premium: bool,
    pub billing_status: String,
    pub at_risk: bool,
    pub external_customer_id: Option<String>,
    pub external_subscription_id: Option<String>,
    pub plan: Option<String>,
    pub grace_period_end: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
