//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8000/docs`
//! - OpenAPI JSON: `http://localhost:8000/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::account::{Label, Prediction, Role, SystemStats};
use crate::gateway::handlers::{HealthResponse, PredictForm};
use crate::gateway::types::MessageData;
use crate::screening::PredictionResult;
use crate::user_auth::TokenResponse;
use crate::user_auth::handlers::CredentialsForm;

/// Bearer JWT issued by `/api/v1/auth/token`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Authorization: Bearer {access_token}"))
                        .build(),
                ),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Spiral Screen API",
        version = "1.0.0",
        description = "Parkinson's screening from hand-drawn spiral and wave images.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::user_auth::handlers::register,
        crate::user_auth::handlers::login,
        crate::gateway::handlers::screening::predict,
        crate::gateway::handlers::screening::get_history,
        crate::gateway::handlers::admin::get_system_stats,
    ),
    components(
        schemas(
            HealthResponse,
            CredentialsForm,
            TokenResponse,
            MessageData,
            PredictForm,
            PredictionResult,
            Prediction,
            SystemStats,
            Label,
            Role,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and token issuance"),
        (name = "Screening", description = "Predictions and history (auth required)"),
        (name = "Admin", description = "System statistics (admin role required)"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;
