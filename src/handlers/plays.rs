//! Play endpoints.
//!
//! - `POST /api/v1/plays` - create a play
//! - `GET /api/v1/plays` - list the team's plays
//! - `GET /api/v1/plays/{id}` - fetch one play
//!
//! Reads resolve the row by id first and then check the owning team, so
//! another tenant's play answers 403 with the same generic body shape as
//! a 404 and never leaks its contents.

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
    models::play::{self, CreatePlayRequest, Play},
    state::AppState,
    validation,
};

pub async fn create_play(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let value = validation::parse_json_body(&body, state.config.max_body_bytes)?;
    validation::require_fields(&value, play::REQUIRED_FIELDS)?;

    let request: CreatePlayRequest = serde_json::from_value(value)
        .map_err(|err| AppError::InvalidRequest(format!("Invalid play payload: {err}")))?;

    let created = sqlx::query_as::<_, Play>(
        r#"
        INSERT INTO plays (team_id, name, description)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(auth.team_id)
    .bind(&request.name)
    .bind(&request.description)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_play(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(play_id): Path<Uuid>,
) -> Result<Json<Play>, AppError> {
    let play = sqlx::query_as::<_, Play>("SELECT * FROM plays WHERE id = $1")
        .bind(play_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("Play"))?;

    if play.team_id != auth.team_id {
        return Err(AppError::AccessDenied);
    }

    Ok(Json(play))
}

pub async fn list_plays(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Play>>, AppError> {
    let plays = sqlx::query_as::<_, Play>(
        "SELECT * FROM plays WHERE team_id = $1 ORDER BY created_at DESC",
    )
    .bind(auth.team_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(plays))
}
