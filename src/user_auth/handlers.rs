use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use super::service::TokenResponse;
use crate::error::ServiceError;
use crate::gateway::{
    state::AppState,
    types::{ApiResponse, MessageData},
};

/// Form-encoded credentials, shared by register and login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CredentialsForm {
    #[validate(length(min = 1, max = 64))]
    #[schema(example = "alice123")]
    pub username: String,
    #[validate(length(min = 1))]
    #[schema(example = "hunter2pass")]
    pub password: String,
}

/// Credentials decoded and validated before the handler runs.
///
/// Missing fields, a wrong content type and validation failures all reject
/// with the standard envelope instead of axum's plain-text form rejection.
#[derive(Debug)]
pub struct ValidatedCredentials(pub CredentialsForm);

impl<S> FromRequest<S> for ValidatedCredentials
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(form) = Form::<CredentialsForm>::from_request(req, state)
            .await
            .map_err(|e| ServiceError::invalid_input(e.body_text()))?;

        form.validate()
            .map_err(|e| ServiceError::invalid_input(e.to_string()))?;

        Ok(Self(form))
    }
}

/// Register a new user
///
/// POST /api/v1/auth/register
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<MessageData>),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already registered"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedCredentials(form): ValidatedCredentials,
) -> Result<(StatusCode, Json<ApiResponse<MessageData>>), ServiceError> {
    state
        .user_auth
        .register(&form.username, &form.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(MessageData {
            message: "User created successfully".to_string(),
        })),
    ))
}

/// Login user and issue a bearer token
///
/// POST /api/v1/auth/token
#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Missing or invalid field"),
        (status = 401, description = "Incorrect username or password"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedCredentials(form): ValidatedCredentials,
) -> Result<Json<ApiResponse<TokenResponse>>, ServiceError> {
    let token = state
        .user_auth
        .authenticate(&form.username, &form.password)
        .await?;
    Ok(Json(ApiResponse::success(token)))
}
