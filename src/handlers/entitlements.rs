//! Entitlement read endpoint.
//!
//! `GET /api/v1/entitlement` - the caller's team billing state, used by
//! dunning banners and upgrade prompts. Teams that have never been
//! through billing get the default free shape.

use axum::{Extension, Json, extract::State};
use chrono::Utc;

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::entitlement::{Entitlement, billing_status},
    services::entitlement_service,
    state::AppState,
};

pub async fn get_entitlement(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Entitlement>, AppError> {
    let entitlement = entitlement_service::entitlement_for_team(&state.pool, auth.team_id)
        .await?
        // No row yet: the team has never checked out.
        .unwrap_or_else(|| Entitlement {
            team_id: auth.team_id,
            premium: false,
            billing_status: billing_status::FREE.to_string(),
            at_risk: false,
            external_customer_id: None,
            external_subscription_id: None,
            plan: None,
            grace_period_end: None,
            updated_at: Utc::now(),
        });

    Ok(Json(entitlement))
}
