pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

/// Build the complete router. Split from [`run_server`] so tests can drive
/// it in-process.
pub fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    // ==========================================================================
    // Auth Routes (public)
    // ==========================================================================
    let auth_routes = Router::new()
        .route("/register", post(crate::user_auth::handlers::register))
        .route("/token", post(crate::user_auth::handlers::login));

    // ==========================================================================
    // Screening Routes - Protected by bearer token
    // ==========================================================================
    let screening_routes = Router::new()
        .route("/predict", post(handlers::predict))
        .route("/history", get(handlers::get_history))
        .layer(from_fn_with_state(
            state.clone(),
            crate::user_auth::jwt_auth_middleware,
        ));

    // ==========================================================================
    // Admin Routes - bearer token, role checked in the handler's service
    // ==========================================================================
    let admin_routes = Router::new()
        .route("/stats", get(handlers::get_system_stats))
        .layer(from_fn_with_state(
            state.clone(),
            crate::user_auth::jwt_auth_middleware,
        ));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/screening", screening_routes)
        .nest("/api/v1/admin", admin_routes)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
        // Stateless docs, added after with_state
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Bind and serve until the process is stopped.
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>, max_upload_bytes: usize) -> Result<()> {
    let app = build_router(state, max_upload_bytes);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} (port in use?)", addr))?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
