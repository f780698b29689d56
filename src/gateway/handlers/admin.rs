use std::sync::Arc;

use axum::{Extension, Json, extract::State};

use super::super::state::AppState;
use super::super::types::ApiResponse;
use crate::account::SystemStats;
use crate::error::ServiceError;
use crate::user_auth::Identity;

/// System-wide counts (admin only)
///
/// GET /api/v1/admin/stats
#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    responses(
        (status = 200, description = "Aggregate counts", body = ApiResponse<SystemStats>),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_system_stats(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<SystemStats>>, ServiceError> {
    let stats = state.screening.system_stats(&identity).await?;
    Ok(Json(ApiResponse::success(stats)))
}
