//! API key model for gateway authentication.
//!
//! Keys are stored as SHA-256 hashes. A request presents the raw key as a
//! bearer credential; the gateway hashes it and looks the hash up among
//! active keys. Revocation flips `is_active` to false and keeps the row,
//! so the audit trail (and the usage ledger's foreign keys) survive.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// User role required for the admin namespace.
pub const ROLE_ADMIN: &str = "admin";

/// Row from the `api_keys` table, joined with the owning user's role and
/// the team's premium flag during authentication.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKeyAuthRow {
    /// Key identifier.
    pub id: Uuid,
    /// Owning team (the tenant).
    pub team_id: Uuid,
    /// Owning user, consulted for role checks.
    pub user_id: Uuid,
    /// Role of the owning user (`admin` or `member`).
    pub role: String,
    /// Team's entitlement flag at authentication time.
    pub premium: bool,
}

/// Admin-facing view of a key. Never exposes the hash.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ApiKeySummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/v1/admin/keys`: which team member the new key
/// belongs to.
#[derive(Debug, serde::Deserialize)]
pub struct CreateKeyRequest {
    pub user_id: Uuid,
}

/// Required fields for key creation, checked as a batch.
pub const CREATE_REQUIRED_FIELDS: &[&str] = &["user_id"];

/// Response for a freshly minted key. The raw key appears here and
/// nowhere else; only its hash is stored.
#[derive(Debug, Serialize)]
pub struct CreatedApiKey {
    pub id: Uuid,
    pub user_id: Uuid,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
}

/// Mint a raw API key: 32 random bytes, hex encoded.
pub fn generate_key() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// SHA-256 hex digest of a raw API key, as stored in `key_hash`.
pub fn hash_key(raw: &str) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_unique_64_hex_chars() {
        let first = generate_key();
        let second = generate_key();
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn hash_is_stable_hex_sha256() {
        // Known SHA-256 of the empty string.
        assert_eq!(
            hash_key(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(hash_key("abc123").len(), 64);
        assert_eq!(hash_key("abc123"), hash_key("abc123"));
        assert_ne!(hash_key("abc123"), hash_key("abc124"));
    }
}
