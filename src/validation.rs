//! Request payload validation for write endpoints.
//!
//! Validation runs in a fixed order, each step terminal on failure:
//! size cap (413), JSON well-formedness (400), then the endpoint's
//! required-field set (one 400 naming every missing field at once).

use axum::body::Bytes;
use serde_json::Value;

use crate::error::AppError;

/// Parse a request body into JSON, enforcing the byte cap first so an
/// oversized body is rejected before any parse work.
pub fn parse_json_body(body: &Bytes, max_bytes: usize) -> Result<Value, AppError> {
    if body.len() > max_bytes {
        return Err(AppError::PayloadTooLarge { limit: max_bytes });
    }

    serde_json::from_slice(body)
        .map_err(|_| AppError::InvalidRequest("Request body must be valid JSON".to_string()))
}

/// Check that every required field is present and non-null, collecting
/// all misses into a single error rather than failing one at a time.
pub fn require_fields(value: &Value, required: &[&str]) -> Result<(), AppError> {
    let missing: Vec<&str> = required
        .iter()
        .filter(|field| value.get(**field).is_none_or(Value::is_null))
        .copied()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}
