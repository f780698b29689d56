//! Health check handler

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiResponse, error_codes};

/// Health check response data
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    /// Database answered a ping
    pub database: bool,
    /// Classifier artifact is loaded; predictions fail with 503 otherwise
    pub model_loaded: bool,
    /// Build revision
    #[schema(example = "a1b2c3d")]
    pub version: String,
}

/// Health check endpoint
///
/// - Healthy: 200 OK + {code: 0, data: {...}}
/// - Database down: 503 Service Unavailable, same data
///
/// A missing model degrades predictions only, so it is reported but does not
/// fail the check.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = ApiResponse<HealthResponse>),
        (status = 503, description = "Database unavailable")
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let database = match state.db.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("[HEALTH] Database ping failed: {}", e);
            false
        }
    };

    let data = HealthResponse {
        database,
        model_loaded: state.screening.classifier_loaded(),
        version: env!("GIT_HASH").to_string(),
    };

    if database {
        (StatusCode::OK, Json(ApiResponse::success(data)))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse {
                code: error_codes::PERSISTENCE_FAILURE,
                msg: "unavailable".to_string(),
                data: Some(data),
            }),
        )
    }
}
