//! Signal model: an observed market event recorded against a play.
//!
//! A signal always references the play it belongs to, explains what was
//! observed, and recommends an action. All three are required on create.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Row from the `signals` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Signal {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub team_id: Uuid,
    pub play_id: Uuid,
    pub explanation: String,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/v1/signals`.
#[derive(Debug, Deserialize)]
pub struct CreateSignalRequest {
    pub play_id: Uuid,
    pub explanation: String,
    pub action: String,
}

/// Required fields for signal creation, checked as a batch.
pub const REQUIRED_FIELDS: &[&str] = &["play_id", "explanation", "action"];
