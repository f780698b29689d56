//! Prediction and history handlers (bearer auth required)

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError},
    },
    http::StatusCode,
};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::ApiResponse;
use crate::account::Prediction;
use crate::error::{ServiceError, ServiceResult};
use crate::screening::{PredictRequest, PredictionResult};
use crate::user_auth::Identity;

/// Multipart body accepted by the predict endpoint (documentation only)
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct PredictForm {
    #[schema(example = "Jane Doe")]
    pub patient_name: String,
    #[schema(example = 63)]
    pub patient_age: i64,
    /// Spiral or wave drawing
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Body-limit hits surface as their own kind; everything else is a
/// malformed request.
fn multipart_error(e: MultipartError) -> ServiceError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Rejected upload over the body limit: {}", e.body_text());
        return ServiceError::PayloadTooLarge;
    }
    ServiceError::invalid_input(format!("Malformed multipart body: {}", e.body_text()))
}

async fn field_text(field: Field<'_>) -> ServiceResult<String> {
    field.text().await.map_err(multipart_error)
}

/// Pull `patient_name`, `patient_age` and `file` out of the upload.
/// Unknown fields are ignored.
async fn read_predict_form(multipart: &mut Multipart) -> ServiceResult<PredictRequest> {
    let mut patient_name = None;
    let mut patient_age = None;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "patient_name" => patient_name = Some(field_text(field).await?),
            "patient_age" => {
                let raw = field_text(field).await?;
                let age = raw.trim().parse::<i64>().map_err(|_| {
                    ServiceError::invalid_input("patient_age must be an integer")
                })?;
                patient_age = Some(age);
            }
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let patient_name =
        patient_name.ok_or_else(|| ServiceError::invalid_input("patient_name is required"))?;
    let patient_age =
        patient_age.ok_or_else(|| ServiceError::invalid_input("patient_age is required"))?;
    let (filename, image) = upload.ok_or_else(|| ServiceError::invalid_input("file is required"))?;

    Ok(PredictRequest {
        patient_name,
        patient_age,
        filename,
        image,
    })
}

/// Classify an uploaded drawing and record the result
///
/// POST /api/v1/screening/predict
#[utoipa::path(
    post,
    path = "/api/v1/screening/predict",
    request_body(content = PredictForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Prediction recorded", body = ApiResponse<PredictionResult>),
        (status = 400, description = "Missing field or undecodable image"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 413, description = "Upload exceeds max_upload_bytes"),
        (status = 503, description = "Classifier model not loaded")
    ),
    security(("bearer_auth" = [])),
    tag = "Screening"
)]
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<PredictionResult>>, ServiceError> {
    let req = read_predict_form(&mut multipart).await?;
    let result = state.screening.predict(&identity, req).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Caller's prediction history, newest first
///
/// GET /api/v1/screening/history
#[utoipa::path(
    get,
    path = "/api/v1/screening/history",
    responses(
        (status = 200, description = "Predictions owned by the caller", body = ApiResponse<Vec<Prediction>>),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer_auth" = [])),
    tag = "Screening"
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<Prediction>>>, ServiceError> {
    let history = state.screening.history(&identity).await?;
    Ok(Json(ApiResponse::success(history)))
}
