//! API key authentication middleware.
//!
//! First stage of the gateway pipeline. Extracts the bearer credential,
//! hashes it, and resolves it against active keys joined with the owning
//! user's role and the team's premium flag. A missing credential gets
//! its own message; an unknown hash and a revoked key get one identical
//! generic rejection, so callers cannot probe which keys exist.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::api_key::{self, ApiKeyAuthRow},
    state::AppState,
};

/// Authentication context attached to every request that passes auth.
///
/// Handlers and downstream middleware extract this from the request
/// extensions to scope queries to the tenant and check roles.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub api_key_id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    /// Team entitlement at authentication time; selects the quota tier.
    pub premium: bool,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == api_key::ROLE_ADMIN
    }
}

/// Pull the bearer credential out of the Authorization header.
/// `None` means no usable credential was presented at all.
pub fn extract_bearer(value: Option<&str>) -> Option<&str> {
    let token = value?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let raw_key = extract_bearer(header).ok_or(AppError::MissingApiKey)?;

    let key_hash = api_key::hash_key(raw_key);

    // One lookup resolves the key, the owner's role and the team tier.
    // The is_active filter makes revoked keys indistinguishable from
    // keys that never existed.
    let row = sqlx::query_as::<_, ApiKeyAuthRow>(
        r#"
        SELECT k.id, k.team_id, k.user_id, u.role,
               COALESCE(e.premium, FALSE) AS premium
        FROM api_keys k
        JOIN users u ON u.id = k.user_id
        LEFT JOIN entitlements e ON e.team_id = k.team_id
        WHERE k.key_hash = $1 AND k.is_active = TRUE
        "#,
    )
    .bind(&key_hash)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::InvalidApiKey)?;

    // Best-effort touch; a failure here must not reject the request.
    if let Err(err) = sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
        .bind(row.id)
        .execute(&state.pool)
        .await
    {
        tracing::warn!(api_key_id = %row.id, "failed to update last_used_at: {err}");
    }

    request.extensions_mut().insert(AuthContext {
        api_key_id: row.id,
        team_id: row.team_id,
        user_id: row.user_id,
        role: row.role,
        premium: row.premium,
    });

    Ok(next.run(request).await)
}

/// Authorization gate for the admin namespace. Runs after
/// authentication; rejects with a permissions error distinct from the
/// 401s above.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let auth = request
        .extensions()
        .get::<AuthContext>()
        .ok_or(AppError::MissingApiKey)?;

    if !auth.is_admin() {
        return Err(AppError::AdminRequired);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(Some("Bearer abc123")), Some("abc123"));
        assert_eq!(extract_bearer(Some("Bearer ")), None);
        assert_eq!(extract_bearer(Some("Basic abc123")), None);
        assert_eq!(extract_bearer(Some("abc123")), None);
        assert_eq!(extract_bearer(None), None);
    }

    #[test]
    fn admin_check_uses_role() {
        let mut auth = AuthContext {
            api_key_id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: "member".to_string(),
            premium: false,
        };
        assert!(!auth.is_admin());
        auth.role = "admin".to_string();
        assert!(auth.is_admin());
    }
}
