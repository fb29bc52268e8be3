//! Admin-namespace endpoints.
//!
//! Everything under `/api/v1/admin` additionally requires the
//! authenticated key's owning user to hold the admin role (enforced by
//! the `require_admin` layer).
//!
//! - `POST /api/v1/admin/keys` - mint a key for a team member
//! - `GET /api/v1/admin/keys` - list the team's API keys
//! - `DELETE /api/v1/admin/keys/{id}` - revoke a key
//! - `GET /api/v1/admin/usage` - recent gateway usage for the team
//!
//! Revocation is a soft deactivation; the row and its usage history
//! stay behind for audit.

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::api_key::{self, ApiKeySummary, CreateKeyRequest, CreatedApiKey},
    models::usage::UsageRecord,
    state::AppState,
    validation,
};

/// Mint a new API key for a member of the caller's team. The raw key is
/// returned exactly once; only its SHA-256 hash is stored.
pub async fn create_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let value = validation::parse_json_body(&body, state.config.max_body_bytes)?;
    validation::require_fields(&value, api_key::CREATE_REQUIRED_FIELDS)?;

    let request: CreateKeyRequest = serde_json::from_value(value)
        .map_err(|err| AppError::InvalidRequest(format!("Invalid key payload: {err}")))?;

    // The key's owner must belong to the caller's team.
    let user_team = sqlx::query_scalar::<_, Uuid>("SELECT team_id FROM users WHERE id = $1")
        .bind(request.user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if user_team != auth.team_id {
        return Err(AppError::AccessDenied);
    }

    let raw_key = api_key::generate_key();
    let key_hash = api_key::hash_key(&raw_key);

    let summary = sqlx::query_as::<_, ApiKeySummary>(
        r#"
        INSERT INTO api_keys (key_hash, team_id, user_id)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, is_active, created_at, last_used_at
        "#,
    )
    .bind(&key_hash)
    .bind(auth.team_id)
    .bind(request.user_id)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(api_key_id = %summary.id, team_id = %auth.team_id, "API key created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedApiKey {
            id: summary.id,
            user_id: summary.user_id,
            api_key: raw_key,
            created_at: summary.created_at,
        }),
    ))
}

pub async fn list_keys(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<ApiKeySummary>>, AppError> {
    let keys = sqlx::query_as::<_, ApiKeySummary>(
        r#"
        SELECT id, user_id, is_active, created_at, last_used_at
        FROM api_keys
        WHERE team_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth.team_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(keys))
}

pub async fn revoke_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(key_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let owner_team = sqlx::query_scalar::<_, Uuid>("SELECT team_id FROM api_keys WHERE id = $1")
        .bind(key_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("API key"))?;

    if owner_team != auth.team_id {
        return Err(AppError::AccessDenied);
    }

    // Never deleted, only deactivated. A revoked key can never
    // authenticate again; the auth lookup filters on is_active.
    sqlx::query("UPDATE api_keys SET is_active = FALSE WHERE id = $1")
        .bind(key_id)
        .execute(&state.pool)
        .await?;

    tracing::info!(api_key_id = %key_id, team_id = %auth.team_id, "API key revoked");

    Ok(StatusCode::NO_CONTENT)
}

/// Most recent ledger entries for the team, newest first.
pub async fn list_usage(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<UsageRecord>>, AppError> {
    let records = sqlx::query_as::<_, UsageRecord>(
        r#"
        SELECT * FROM usage_records
        WHERE team_id = $1
        ORDER BY created_at DESC
        LIMIT 100
        "#,
    )
    .bind(auth.team_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(records))
}
