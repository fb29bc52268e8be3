//! Daily quota enforcement middleware.
//!
//! Runs after authentication. The team's request count for the current
//! UTC day is compared against its tier limit; at or above the limit the
//! request terminates with 429 carrying the limit, the count used and
//! the reset time (next UTC midnight).
//!
//! Policy is configurable: the default counts the usage ledger
//! (read-then-compare, the later ledger write races it, minor overshoot
//! accepted), strict mode reserves a slot through an atomic conditional
//! increment.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::{
    error::AppError, middleware::auth::AuthContext, services::usage_service, state::AppState,
};

pub async fn quota_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth = request
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or(AppError::MissingApiKey)?;

    let now = Utc::now();
    let limit = state.config.daily_limit(auth.premium);

    if state.config.strict_quota {
        if usage_service::try_reserve(&state.pool, auth.team_id, now, limit)
            .await?
            .is_none()
        {
            let used = usage_service::counter_used(&state.pool, auth.team_id, now).await?;
            return Err(AppError::QuotaExceeded {
                limit,
                used,
                reset: usage_service::next_reset(now),
            });
        }
    } else {
        // Consistent per-team count across all of the team's keys.
        let used = usage_service::count_today(&state.pool, auth.team_id, now).await?;
        if !usage_service::within_limit(used, limit) {
            return Err(AppError::QuotaExceeded {
                limit,
                used,
                reset: usage_service::next_reset(now),
            });
        }
    }

    Ok(next.run(request).await)
}
