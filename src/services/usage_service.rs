//! Usage ledger access and quota accounting.
//!
//! Two quota policies share the same limit semantics:
//!
//! - **eventual** (default): count the team's ledger rows for the
//!   current UTC day, then compare. The eventual ledger write happens
//!   after dispatch, so concurrent bursts can overshoot the limit by a
//!   few requests. That gap is a deliberate simplicity/cost tradeoff,
//!   not a bug; the tests below pin the boundary behavior only.
//! - **strict**: a single conditional increment on `quota_counters`,
//!   exact under arbitrary concurrency.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::usage::NewUsageRecord;

/// Start of the UTC day containing `now`.
pub fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// When the daily quota window resets: the next UTC midnight.
pub fn next_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    day_start(now) + Duration::days(1)
}

/// Whether a team with `used` requests against `limit` may proceed.
/// At the limit means rejected; one below means allowed.
pub fn within_limit(used: i64, limit: i64) -> bool {
    used < limit
}

/// Count the team's gateway requests for the current UTC day.
///
/// Aggregates across every key the team owns; the quota is per tenant,
/// never per key.
pub async fn count_today(
    pool: &DbPool,
    team_id: Uuid,
    now: DateTime<Utc>,
) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM usage_records WHERE team_id = $1 AND created_at >= $2",
    )
    .bind(team_id)
    .bind(day_start(now))
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Strict-mode reservation: atomically increment the team's counter for
/// the day, but only while it is below the limit. Returns the new count
/// on success, or `None` when the team is already at the limit.
pub async fn try_reserve(
    pool: &DbPool,
    team_id: Uuid,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Option<i64>, AppError> {
    let used = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO quota_counters (team_id, day, used)
        VALUES ($1, $2, 1)
        ON CONFLICT (team_id, day)
        DO UPDATE SET used = quota_counters.used + 1
        WHERE quota_counters.used < $3
        RETURNING used
        "#,
    )
    .bind(team_id)
    .bind(now.date_naive())
    .bind(limit)
    .fetch_optional(pool)
    .await?;

    Ok(used)
}

/// Current strict-mode counter value for the day (for the 429 body).
pub async fn counter_used(
    pool: &DbPool,
    team_id: Uuid,
    now: DateTime<Utc>,
) -> Result<i64, AppError> {
    let used = sqlx::query_scalar::<_, i64>(
        "SELECT used FROM quota_counters WHERE team_id = $1 AND day = $2",
    )
    .bind(team_id)
    .bind(now.date_naive())
    .fetch_optional(pool)
    .await?
    .unwrap_or(0);

    Ok(used)
}

/// Append one ledger row. The ledger is immutable; nothing updates or
/// deletes these records.
pub async fn record(pool: &DbPool, entry: &NewUsageRecord) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO usage_records (api_key_id, team_id, endpoint, method, response_code, latency_ms)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(entry.api_key_id)
    .bind(entry.team_id)
    .bind(&entry.endpoint)
    .bind(&entry.method)
    .bind(entry.response_code)
    .bind(entry.latency_ms)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_start_truncates_to_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 17, 45, 9).unwrap();
        let start = day_start(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn reset_is_next_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 17, 45, 9).unwrap();
        assert_eq!(
            next_reset(now),
            Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn reset_rolls_over_month_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 59).unwrap();
        assert_eq!(
            next_reset(now),
            Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn at_limit_is_rejected_one_below_proceeds() {
        // The boundary the suite pins down. Concurrency tolerance in
        // eventual mode (slight overshoot between the count and the
        // later ledger write) is a documented known boundary, not
        // asserted here.
        assert!(within_limit(99, 100));
        assert!(!within_limit(100, 100));
        assert!(!within_limit(101, 100));
    }
}
