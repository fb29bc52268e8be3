//! Inbound billing webhook endpoint.
//!
//! `POST /webhooks/billing` - public route, gated by signature
//! verification instead of API keys. Responds 200 for every processed
//! or deliberately ignored event, 400 when the signature or payload is
//! bad, and 5xx when a store write fails so the sender redelivers.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use chrono::Utc;
use serde_json::{Value, json};

use crate::{error::AppError, services::webhook_service, state::AppState};

/// Signature header the payment processor sends with each delivery.
pub const SIGNATURE_HEADER: &str = "x-billing-signature";

pub async fn billing_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    // Missing header fails exactly like a bad one: closed.
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::InvalidSignature)?;

    webhook_service::verify_signature(
        &body,
        signature,
        &state.config.billing_webhook_secret,
        Utc::now(),
        state.config.webhook_tolerance_secs,
    )?;

    let event = webhook_service::parse_event(&body)?;

    webhook_service::process_event(&state.pool, &event).await?;

    Ok(Json(json!({ "received": true })))
}
