//! Webhook processor for payment-processor billing events.
//!
//! Three stages, each terminal on failure: signature verification
//! (fails closed), payload parsing, then event-type dispatch into
//! entitlement transitions. Handlers write absolute state, so redelivery
//! of the same event is harmless; a customer id that resolves to no team
//! is logged and acknowledged rather than errored, so a permanently
//! unresolvable event never turns into a retry storm.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::billing_event::{
    BillingEvent, CHECKOUT_COMPLETED, INVOICE_PAYMENT_FAILED, SUBSCRIPTION_DELETED,
    SUBSCRIPTION_UPDATED,
};
use crate::services::entitlement_service::{self, EntitlementTransition};

type HmacSha256 = Hmac<Sha256>;

/// Verify a processor signature header against the raw request body.
///
/// Header format: `t=<unix seconds>,v1=<hex hmac>`. The signed string is
/// the timestamp, a dot, and the raw body, MACed with HMAC-SHA256 under
/// the shared webhook secret. Comparison goes through
/// [`Mac::verify_slice`], which is constant-time. Every failure mode -
/// missing or malformed header, unparsable or stale timestamp, bad hex,
/// MAC mismatch - collapses into the same rejection; verification never
/// proceeds best-effort.
pub fn verify_signature(
    raw_body: &[u8],
    signature_header: &str,
    secret: &str,
    now: DateTime<Utc>,
    tolerance_secs: i64,
) -> Result<(), AppError> {
    let mut timestamp: Option<i64> = None;
    let mut signature: Option<Vec<u8>> = None;

    for part in signature_header.split(',') {
        let mut kv = part.trim().splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(value)) => timestamp = value.parse().ok(),
            (Some("v1"), Some(value)) => signature = hex::decode(value).ok(),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(AppError::InvalidSignature)?;
    let signature = signature.ok_or(AppError::InvalidSignature)?;

    if (now.timestamp() - timestamp).abs() > tolerance_secs {
        return Err(AppError::InvalidSignature);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AppError::InvalidSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(raw_body);

    mac.verify_slice(&signature)
        .map_err(|_| AppError::InvalidSignature)
}

/// Parse a verified body into a typed event. Malformed JSON after
/// signature acceptance is a 400; nothing gets processed.
pub fn parse_event(raw_body: &[u8]) -> Result<BillingEvent, AppError> {
    serde_json::from_slice(raw_body)
        .map_err(|_| AppError::InvalidRequest("Malformed event payload".to_string()))
}

/// Map a reported subscription status onto a transition.
///
/// Only `active` grants premium; `past_due` is treated as a payment
/// problem. Anything else (`canceled`, `unpaid`, `trialing`, ...) gets
/// no automatic transition - the deletion and payment-failure events
/// carry those signals explicitly.
pub fn transition_for_subscription_status(
    status: &str,
    subscription_id: Option<String>,
) -> Option<EntitlementTransition> {
    match status {
        "active" => Some(EntitlementTransition::Activate {
            subscription_id,
            plan: None,
        }),
        "past_due" => Some(EntitlementTransition::PaymentFailed),
        _ => None,
    }
}

/// Dispatch one verified, parsed event.
///
/// Unrecognized event types are acknowledged as no-ops so the sender
/// stops redelivering events this system does not care about. Store
/// errors propagate as 5xx so the sender retries.
pub async fn process_event(pool: &DbPool, event: &BillingEvent) -> Result<(), AppError> {
    match event.event_type.as_str() {
        CHECKOUT_COMPLETED => handle_checkout_completed(pool, event).await,
        SUBSCRIPTION_UPDATED => handle_subscription_updated(pool, event).await,
        SUBSCRIPTION_DELETED => {
            apply_for_customer(pool, event, EntitlementTransition::Cancel).await
        }
        INVOICE_PAYMENT_FAILED => {
            apply_for_customer(pool, event, EntitlementTransition::PaymentFailed).await
        }
        other => {
            tracing::debug!(event_id = %event.id, event_type = other, "ignoring unhandled event type");
            Ok(())
        }
    }
}

/// Checkout completed: resolve the team from checkout metadata, attach
/// the external customer, and activate the entitlement.
async fn handle_checkout_completed(pool: &DbPool, event: &BillingEvent) -> Result<(), AppError> {
    let object = &event.data.object;

    let team_id = object
        .metadata
        .as_ref()
        .and_then(|m| m.team_id.as_deref())
        .and_then(|raw| Uuid::parse_str(raw).ok());
    let Some(team_id) = team_id else {
        tracing::warn!(event_id = %event.id, "checkout completed without a resolvable team_id");
        return Ok(());
    };

    let Some(customer_id) = object.customer.as_deref() else {
        tracing::warn!(event_id = %event.id, team_id = %team_id, "checkout completed without a customer id");
        return Ok(());
    };

    entitlement_service::attach_customer(pool, team_id, customer_id).await?;

    let plan = object.metadata.as_ref().and_then(|m| m.plan.clone());
    let transition = EntitlementTransition::Activate {
        subscription_id: object.subscription_id(&event.event_type),
        plan,
    };
    entitlement_service::apply_transition(pool, team_id, &transition).await?;

    tracing::info!(event_id = %event.id, team_id = %team_id, "entitlement activated via checkout");
    Ok(())
}

/// Subscription updated: mirror the processor's view, conservatively.
async fn handle_subscription_updated(pool: &DbPool, event: &BillingEvent) -> Result<(), AppError> {
    let object = &event.data.object;
    let Some(status) = object.status.as_deref() else {
        tracing::warn!(event_id = %event.id, "subscription update without a status");
        return Ok(());
    };

    let Some(transition) =
        transition_for_subscription_status(status, object.subscription_id(&event.event_type))
    else {
        tracing::debug!(event_id = %event.id, status, "no transition for subscription status");
        return Ok(());
    };

    apply_for_customer(pool, event, transition).await
}

/// Resolve the event's customer id to a team and apply a transition.
/// A lookup miss is acknowledged, not retried.
async fn apply_for_customer(
    pool: &DbPool,
    event: &BillingEvent,
    transition: EntitlementTransition,
) -> Result<(), AppError> {
    let Some(customer_id) = event.data.object.customer.as_deref() else {
        tracing::warn!(event_id = %event.id, "billing event without a customer id");
        return Ok(());
    };

    let Some(team_id) = entitlement_service::team_by_customer(pool, customer_id).await? else {
        tracing::warn!(event_id = %event.id, customer_id, "no team for external customer");
        return Ok(());
    };

    entitlement_service::apply_transition(pool, team_id, &transition).await?;

    tracing::info!(
        event_id = %event.id,
        team_id = %team_id,
        event_type = %event.event_type,
        "entitlement transition applied"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SECRET: &str = "whsec_test_secret";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn sign(body: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn valid_signature_verifies() {
        let body = br#"{"id":"evt_1","type":"noop","data":{"object":{}}}"#;
        let header = sign(body, SECRET, now().timestamp());
        assert!(verify_signature(body, &header, SECRET, now(), 300).is_ok());
    }

    #[test]
    fn tampered_body_is_rejected() {
        let body = br#"{"id":"evt_1"}"#;
        let header = sign(body, SECRET, now().timestamp());
        let tampered = br#"{"id":"evt_2"}"#;
        assert!(verify_signature(tampered, &header, SECRET, now(), 300).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let body = br#"{"id":"evt_1"}"#;
        let header = sign(body, "whsec_other", now().timestamp());
        assert!(verify_signature(body, &header, SECRET, now(), 300).is_err());
    }

    #[test]
    fn malformed_headers_fail_closed() {
        let body = b"{}";
        for header in ["", "garbage", "t=notanumber,v1=00", "v1=00", "t=12345", "t=12345,v1=zz"] {
            assert!(
                verify_signature(body, header, SECRET, now(), 300).is_err(),
                "header {header:?} should be rejected"
            );
        }
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let body = b"{}";
        let stale = now().timestamp() - 600;
        let header = sign(body, SECRET, stale);
        assert!(verify_signature(body, &header, SECRET, now(), 300).is_err());
    }

    #[test]
    fn timestamp_within_tolerance_is_accepted() {
        let body = b"{}";
        let skewed = now().timestamp() - 120;
        let header = sign(body, SECRET, skewed);
        assert!(verify_signature(body, &header, SECRET, now(), 300).is_ok());
    }

    #[test]
    fn malformed_payload_is_rejected_after_signature() {
        match parse_event(b"{not json") {
            Err(AppError::InvalidRequest(_)) => {}
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[test]
    fn active_status_maps_to_activation() {
        let transition = transition_for_subscription_status("active", Some("sub_1".into()));
        assert_eq!(
            transition,
            Some(EntitlementTransition::Activate {
                subscription_id: Some("sub_1".into()),
                plan: None,
            })
        );
    }

    #[test]
    fn past_due_status_maps_to_payment_failure() {
        assert_eq!(
            transition_for_subscription_status("past_due", None),
            Some(EntitlementTransition::PaymentFailed)
        );
    }

    #[test]
    fn other_statuses_grant_nothing() {
        // Conservative: only the explicit deletion/payment events
        // revoke, and only "active" grants.
        for status in ["canceled", "unpaid", "trialing", "incomplete", ""] {
            assert_eq!(transition_for_subscription_status(status, None), None);
        }
    }

    #[test]
    fn cancellation_after_checkout_restores_free_state() {
        // Value-level round trip: the cancel transition lands on the
        // same absolute state regardless of what activation set.
        let activate = EntitlementTransition::Activate {
            subscription_id: Some("sub_42".into()),
            plan: Some("monthly".into()),
        };
        assert!(activate.premium());

        let cancel = EntitlementTransition::Cancel;
        assert!(!cancel.premium());
        assert_eq!(cancel.billing_status(), "free");
        assert!(!cancel.at_risk());
    }

    #[test]
    fn transitions_are_absolute_hence_idempotent() {
        // Applying the same transition twice writes identical values;
        // there is no delta anywhere in the state machine.
        let first = EntitlementTransition::Cancel;
        let second = EntitlementTransition::Cancel;
        assert_eq!(first, second);
        assert_eq!(
            (first.premium(), first.billing_status(), first.at_risk()),
            (second.premium(), second.billing_status(), second.at_risk())
        );
    }
}
