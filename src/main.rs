//! Marketing operations backend - entry point.
//!
//! Serves the billing entitlement and API gateway slice of the product:
//! a signature-verified webhook endpoint that keeps team entitlements in
//! sync with the payment processor, and authenticated gateway routes for
//! plays and signals with per-team daily quotas and usage logging.
//!
//! # Request pipeline (gateway routes)
//!
//! Authentication -> quota check -> usage logging wraps -> handler
//! (payload validation, role and tenant checks live in the handlers and
//! the admin route layer). Each stage terminates the request with its
//! own rejection; there are no retries inside the gateway.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build the router with routes and middleware
//! 5. Start serving on the configured port

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;
mod state;
mod validation;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let server_port = config.server_port;
    // Transport-level cap sits above the canonical limit so oversized
    // bodies still reach the handler's own 413 with the standard error
    // shape, while truly unbounded uploads are cut off early.
    let transport_body_cap = config.max_body_bytes.saturating_mul(2);
    let state = AppState::new(pool, config);

    // Admin namespace: same gateway stack plus the role gate.
    let admin_routes = Router::new()
        .route("/api/v1/admin/keys", post(handlers::admin::create_key))
        .route("/api/v1/admin/keys", get(handlers::admin::list_keys))
        .route(
            "/api/v1/admin/keys/{id}",
            delete(handlers::admin::revoke_key),
        )
        .route("/api/v1/admin/usage", get(handlers::admin::list_usage))
        .route_layer(axum_middleware::from_fn(middleware::auth::require_admin));

    // Gateway routes share one stack. Layers added later wrap the ones
    // before them, so authentication runs first, then quota, then usage
    // logging immediately around the handler.
    let gateway_routes = Router::new()
        .route("/api/v1/plays", post(handlers::plays::create_play))
        .route("/api/v1/plays", get(handlers::plays::list_plays))
        .route("/api/v1/plays/{id}", get(handlers::plays::get_play))
        .route("/api/v1/signals", post(handlers::signals::create_signal))
        .route("/api/v1/signals", get(handlers::signals::list_signals))
        .route("/api/v1/signals/{id}", get(handlers::signals::get_signal))
        .route(
            "/api/v1/entitlement",
            get(handlers::entitlements::get_entitlement),
        )
        .merge(admin_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::usage::record_usage,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::quota::quota_middleware,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    let app = Router::new()
        // Public routes: liveness and the signature-gated webhook.
        .route("/health", get(handlers::health::health_check))
        .route(
            "/webhooks/billing",
            post(handlers::webhooks::billing_webhook),
        )
        .merge(gateway_routes)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(transport_body_cap))
        .with_state(state);

    let addr = format!("0.0.0.0:{server_port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
