//! Signal endpoints.
//!
//! - `POST /api/v1/signals` - record a signal against a play
//! - `GET /api/v1/signals` - list the team's signals
//! - `GET /api/v1/signals/{id}` - fetch one signal
//!
//! Creation requires a play reference, an explanation and an action; all
//! missing fields come back in one 400. The referenced play must belong
//! to the caller's team.

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
    models::signal::{self, CreateSignalRequest, Signal},
    state::AppState,
    validation,
};

pub async fn create_signal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let value = validation::parse_json_body(&body, state.config.max_body_bytes)?;
    validation::require_fields(&value, signal::REQUIRED_FIELDS)?;

    let request: CreateSignalRequest = serde_json::from_value(value)
        .map_err(|err| AppError::InvalidRequest(format!("Invalid signal payload: {err}")))?;

    // Tenant check on the referenced play before anything is written.
    let play_team = sqlx::query_scalar::<_, Uuid>("SELECT team_id FROM plays WHERE id = $1")
        .bind(request.play_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("Play"))?;

    if play_team != auth.team_id {
        return Err(AppError::AccessDenied);
    }

    let created = sqlx::query_as::<_, Signal>(
        r#"
        INSERT INTO signals (team_id, play_id, explanation, action)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(auth.team_id)
    .bind(request.play_id)
    .bind(&request.explanation)
    .bind(&request.action)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_signal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(signal_id): Path<Uuid>,
) -> Result<Json<Signal>, AppError> {
    let signal = sqlx::query_as::<_, Signal>("SELECT * FROM signals WHERE id = $1")
        .bind(signal_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("Signal"))?;

    if signal.team_id != auth.team_id {
        return Err(AppError::AccessDenied);
    }

    Ok(Json(signal))
}

pub async fn list_signals(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Signal>>, AppError> {
    let signals = sqlx::query_as::<_, Signal>(
        "SELECT * FROM signals WHERE team_id = $1 ORDER BY created_at DESC",
    )
    .bind(auth.team_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(signals))
}
