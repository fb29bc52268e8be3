//! Entitlement transitions - the billing state machine's write side.
//!
//! Every mutation is an absolute assignment (set-to-value, never a
//! delta), so applying the same transition twice leaves the same state:
//! at-least-once webhook delivery is safe by construction. A transition
//! covers the team's entitlement row and every member user's mirrored
//! premium flag inside one database transaction, so no user can observe
//! a stale flag after the team transition commits.

use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::entitlement::{Entitlement, billing_status};

/// An absolute entitlement state change derived from a billing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitlementTransition {
    /// Paid subscription confirmed: premium on, status active, at-risk
    /// cleared, subscription/plan recorded when known.
    Activate {
        subscription_id: Option<String>,
        plan: Option<String>,
    },
    /// Hard cancellation: premium off immediately, status free,
    /// subscription id, plan and any grace period cleared.
    Cancel,
    /// Payment failed (or subscription reported past due): premium off
    /// immediately, at-risk flagged for dunning, status past_due.
    PaymentFailed,
}

impl EntitlementTransition {
    pub fn premium(&self) -> bool {
        matches!(self, EntitlementTransition::Activate { .. })
    }

    pub fn billing_status(&self) -> &'static str {
        match self {
            EntitlementTransition::Activate { .. } => billing_status::ACTIVE,
            EntitlementTransition::Cancel => billing_status::FREE,
            EntitlementTransition::PaymentFailed => billing_status::PAST_DUE,
        }
    }

    pub fn at_risk(&self) -> bool {
        matches!(self, EntitlementTransition::PaymentFailed)
    }
}

/// Resolve the team owning an external customer id, if any.
pub async fn team_by_customer(
    pool: &DbPool,
    customer_id: &str,
) -> Result<Option<Uuid>, AppError> {
    let team_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT team_id FROM entitlements WHERE external_customer_id = $1",
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;

    Ok(team_id)
}

/// Look up a team's entitlement row.
pub async fn entitlement_for_team(
    pool: &DbPool,
    team_id: Uuid,
) -> Result<Option<Entitlement>, AppError> {
    let entitlement = sqlx::query_as::<_, Entitlement>(
        "SELECT * FROM entitlements WHERE team_id = $1",
    )
    .bind(team_id)
    .fetch_optional(pool)
    .await?;

    Ok(entitlement)
}

/// Associate an external customer with a team (checkout completion).
///
/// Upserts the entitlement row so a team that has never been through
/// billing gets one on first checkout; a repeated delivery of the same
/// checkout event overwrites with identical values.
pub async fn attach_customer(
    pool: &DbPool,
    team_id: Uuid,
    customer_id: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO entitlements (team_id, external_customer_id)
        VALUES ($1, $2)
        ON CONFLICT (team_id)
        DO UPDATE SET external_customer_id = EXCLUDED.external_customer_id,
                      updated_at = NOW()
        "#,
    )
    .bind(team_id)
    .bind(customer_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Apply a transition to a team and its member mirrors atomically.
///
/// The entitlement row and every member user's `is_premium` flag change
/// in the same database transaction; either all of it commits or none.
pub async fn apply_transition(
    pool: &DbPool,
    team_id: Uuid,
    transition: &EntitlementTransition,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    match transition {
        EntitlementTransition::Activate {
            subscription_id,
            plan,
        } => {
            sqlx::query(
                r#"
                UPDATE entitlements
                SET premium = TRUE,
                    billing_status = $1,
                    at_risk = FALSE,
                    external_subscription_id = COALESCE($2, external_subscription_id),
                    plan = COALESCE($3, plan),
                    updated_at = NOW()
                WHERE team_id = $4
                "#,
            )
            .bind(transition.billing_status())
            .bind(subscription_id)
            .bind(plan)
            .bind(team_id)
            .execute(&mut *tx)
            .await?;
        }
        EntitlementTransition::Cancel => {
            sqlx::query(
                r#"
                UPDATE entitlements
                SET premium = FALSE,
                    billing_status = $1,
                    at_risk = FALSE,
                    external_subscription_id = NULL,
                    plan = NULL,
                    grace_period_end = NULL,
                    updated_at = NOW()
                WHERE team_id = $2
                "#,
            )
            .bind(transition.billing_status())
            .bind(team_id)
            .execute(&mut *tx)
            .await?;
        }
        EntitlementTransition::PaymentFailed => {
            sqlx::query(
                r#"
                UPDATE entitlements
                SET premium = FALSE,
                    billing_status = $1,
                    at_risk = TRUE,
                    updated_at = NOW()
                WHERE team_id = $2
                "#,
            )
            .bind(transition.billing_status())
            .bind(team_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    // Mirror the team flag onto every member in the same transaction.
    sqlx::query("UPDATE users SET is_premium = $1 WHERE team_id = $2")
        .bind(transition.premium())
        .bind(team_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activate_sets_premium_active_and_clears_risk() {
        let transition = EntitlementTransition::Activate {
            subscription_id: Some("sub_42".into()),
            plan: Some("monthly".into()),
        };
        assert!(transition.premium());
        assert_eq!(transition.billing_status(), billing_status::ACTIVE);
        assert!(!transition.at_risk());
    }

    #[test]
    fn cancel_revokes_premium_without_risk_flag() {
        // A clean cancellation is not a payment problem.
        let transition = EntitlementTransition::Cancel;
        assert!(!transition.premium());
        assert_eq!(transition.billing_status(), billing_status::FREE);
        assert!(!transition.at_risk());
    }

    #[test]
    fn payment_failure_revokes_premium_and_flags_risk_together() {
        let transition = EntitlementTransition::PaymentFailed;
        assert!(!transition.premium());
        assert_eq!(transition.billing_status(), billing_status::PAST_DUE);
        assert!(transition.at_risk());
    }

    #[test]
    fn premium_implies_active_status() {
        // The entitlement invariant, checked across every variant.
        let all = [
            EntitlementTransition::Activate {
                subscription_id: None,
                plan: None,
            },
            EntitlementTransition::Cancel,
            EntitlementTransition::PaymentFailed,
        ];
        for transition in &all {
            if transition.premium() {
                assert_eq!(transition.billing_status(), billing_status::ACTIVE);
            }
        }
    }
}
