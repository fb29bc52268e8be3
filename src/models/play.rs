//! Play model: a team's campaign playbook entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Row from the `plays` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Play {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub team_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/v1/plays`. `name` is required; enforcement happens
/// field-set first so all missing fields are reported together.
#[derive(Debug, Deserialize)]
pub struct CreatePlayRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Required fields for play creation, checked as a batch.
pub const REQUIRED_FIELDS: &[&str] = &["name"];
