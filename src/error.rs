//! Service error types.
//!
//! Every fallible core operation returns [`ServiceError`]. Each variant maps to
//! a stable API code and HTTP status, and renders as the standard
//! [`ApiResponse`] envelope.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::gateway::types::{ApiResponse, error_codes};
use crate::inference::ClassifierError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Username already registered")]
    DuplicateIdentity,

    /// Unknown username and wrong password are deliberately the same variant.
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Could not validate credentials")]
    Unauthenticated,

    #[error("Not authorized. Admin access required.")]
    Forbidden,

    #[error("Uploaded file is not a decodable image")]
    UnsupportedImage,

    #[error("Classifier model is not loaded")]
    ModelUnavailable,

    #[error("Upload exceeds the maximum allowed size")]
    PayloadTooLarge,

    #[error("Database error: {0}")]
    PersistenceFailure(#[from] sqlx::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Inference failed: {0}")]
    InferenceFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// API error code carried in the response envelope.
    pub fn code(&self) -> i32 {
        match self {
            Self::DuplicateIdentity => error_codes::DUPLICATE_IDENTITY,
            Self::InvalidCredentials => error_codes::AUTH_FAILED,
            Self::Unauthenticated => error_codes::UNAUTHENTICATED,
            Self::Forbidden => error_codes::FORBIDDEN,
            Self::UnsupportedImage => error_codes::UNSUPPORTED_IMAGE,
            Self::ModelUnavailable => error_codes::MODEL_UNAVAILABLE,
            Self::PayloadTooLarge => error_codes::PAYLOAD_TOO_LARGE,
            Self::PersistenceFailure(_) => error_codes::PERSISTENCE_FAILURE,
            Self::InvalidInput(_) => error_codes::INVALID_PARAMETER,
            Self::InferenceFailure(_) => error_codes::INFERENCE_FAILURE,
            Self::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::DuplicateIdentity => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UnsupportedImage | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::PersistenceFailure(_) | Self::InferenceFailure(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to the caller.
    fn public_message(&self) -> String {
        match self {
            Self::PersistenceFailure(_) => "Failed to access the record store".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<ClassifierError> for ServiceError {
    fn from(e: ClassifierError) -> Self {
        match e {
            ClassifierError::Unavailable => ServiceError::ModelUnavailable,
            other => ServiceError::InferenceFailure(other.to_string()),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match &self {
            Self::PersistenceFailure(e) => tracing::error!("Persistence failure: {}", e),
            Self::InferenceFailure(msg) => tracing::error!("Inference failure: {}", msg),
            Self::Internal(msg) => tracing::error!("Internal error: {}", msg),
            _ => {}
        }

        let status = self.http_status();
        let body = ApiResponse::<()>::error(self.code(), self.public_message());
        let mut response = (status, Json(body)).into_response();
        if matches!(self, Self::Unauthenticated) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
