//! Usage ledger model.
//!
//! One immutable row per gateway request. Quota enforcement aggregates
//! these by team over the current UTC day; team_id is stored on each row
//! so the count never joins through `api_keys`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Row from the append-only `usage_records` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub api_key_id: Uuid,
    #[serde(skip_serializing)]
    pub team_id: Uuid,
    pub endpoint: String,
    pub method: String,
    pub response_code: i32,
    pub latency_ms: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new ledger entry; the id and timestamp come from the
/// database defaults.
#[derive(Debug, Clone)]
pub struct NewUsageRecord {
    pub api_key_id: Uuid,
    pub team_id: Uuid,
    pub endpoint: String,
    pub method: String,
    pub response_code: i32,
    pub latency_ms: i64,
}
