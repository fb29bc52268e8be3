//! Usage logging middleware.
//!
//! Innermost layer of the gateway stack: wraps the handler, times it,
//! and appends exactly one ledger row with the final response code,
//! whatever the handler's outcome was. A ledger insert failure is
//! logged and never fails the request itself.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    middleware::auth::AuthContext, models::usage::NewUsageRecord, services::usage_service,
    state::AppState,
};

pub async fn record_usage(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let auth = request.extensions().get::<AuthContext>().cloned();
    let endpoint = request.uri().path().to_string();
    let method = request.method().to_string();

    let start = Instant::now();
    let response = next.run(request).await;
    let latency_ms = start.elapsed().as_millis() as i64;

    // Only requests that passed authentication have a key to attribute
    // the usage to; the middleware ordering guarantees this is present.
    if let Some(auth) = auth {
        let entry = NewUsageRecord {
            api_key_id: auth.api_key_id,
            team_id: auth.team_id,
            endpoint,
            method,
            response_code: i32::from(response.status().as_u16()),
            latency_ms,
        };
        if let Err(err) = usage_service::record(&state.pool, &entry).await {
            tracing::error!(team_id = %auth.team_id, "failed to append usage record: {err}");
        }
    }

    response
}
