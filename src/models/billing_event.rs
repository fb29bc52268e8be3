//! Incoming payment-processor webhook events.
//!
//! Events arrive as JSON with a `type` discriminator and a `data.object`
//! whose shape varies by type (checkout session, subscription, invoice).
//! Only the fields this system reads are modeled; everything else in the
//! payload is ignored by serde.
//!
//! # Event types handled
//!
//! - `checkout.session.completed`: carries `metadata.team_id` and
//!   `metadata.plan`, plus the customer/subscription identifiers to
//!   associate with the team
//! - `customer.subscription.updated`: the object is the subscription,
//!   with its `status` and owning `customer`
//! - `customer.subscription.deleted`: cancellation
//! - `invoice.payment_failed`: the object is the invoice, with `customer`
//!
//! Anything else is acknowledged without processing.

use serde::Deserialize;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const SUBSCRIPTION_UPDATED: &str = "customer.subscription.updated";
pub const SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";
pub const INVOICE_PAYMENT_FAILED: &str = "invoice.payment_failed";

/// One webhook delivery from the payment processor.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingEvent {
    /// Processor-assigned event id (used only for logging; handlers are
    /// idempotent by writing absolute state, so no dedup table exists).
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: EventObject,
}

/// The `data.object` fields shared across the event types we handle.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventObject {
    /// Object id (subscription id for subscription events).
    #[serde(default)]
    pub id: Option<String>,

    /// External customer id, the key used to resolve the owning team.
    #[serde(default)]
    pub customer: Option<String>,

    /// Subscription id, present on checkout sessions and invoices.
    #[serde(default)]
    pub subscription: Option<String>,

    /// Subscription status (`active`, `past_due`, `canceled`, ...).
    #[serde(default)]
    pub status: Option<String>,

    /// Checkout metadata set when the session was created.
    #[serde(default)]
    pub metadata: Option<EventMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventMetadata {
    #[serde(default)]
    pub team_id: Option<String>,

    #[serde(default)]
    pub plan: Option<String>,
}

impl EventObject {
    /// Subscription id for this object: subscription events carry it as
    /// the object id, checkout sessions and invoices as `subscription`.
    pub fn subscription_id(&self, event_type: &str) -> Option<String> {
        match event_type {
            SUBSCRIPTION_UPDATED | SUBSCRIPTION_DELETED => self.id.clone(),
            _ => self.subscription.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_checkout_session() {
        let raw = r#"{
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_1",
                    "customer": "cus_9",
                    "subscription": "sub_42",
                    "metadata": { "team_id": "7f1aa2f0-1111-4222-8333-944445555666", "plan": "monthly" }
                }
            }
        }"#;
        let event: BillingEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.event_type, CHECKOUT_COMPLETED);
        let object = &event.data.object;
        assert_eq!(object.customer.as_deref(), Some("cus_9"));
        assert_eq!(
            object.subscription_id(&event.event_type).as_deref(),
            Some("sub_42")
        );
        let metadata = object.metadata.as_ref().unwrap();
        assert_eq!(metadata.plan.as_deref(), Some("monthly"));
    }

    #[test]
    fn parses_subscription_event_with_unknown_fields() {
        let raw = r#"{
            "id": "evt_2",
            "type": "customer.subscription.deleted",
            "data": {
                "object": {
                    "id": "sub_42",
                    "customer": "cus_9",
                    "status": "canceled",
                    "cancel_at_period_end": false,
                    "items": { "data": [] }
                }
            }
        }"#;
        let event: BillingEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(
            event.data.object.subscription_id(&event.event_type).as_deref(),
            Some("sub_42")
        );
        assert_eq!(event.data.object.status.as_deref(), Some("canceled"));
    }

    #[test]
    fn missing_fields_default_to_none() {
        let raw = r#"{"id": "evt_3", "type": "invoice.payment_failed", "data": {"object": {}}}"#;
        let event: BillingEvent = serde_json::from_str(raw).unwrap();
        assert!(event.data.object.customer.is_none());
        assert!(event.data.object.metadata.is_none());
    }
}
