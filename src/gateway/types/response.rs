//! API Response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `error_codes`: Standard error code constants
//! - Response DTOs shared by several handlers

use serde::Serialize;
use utoipa::ToSchema;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Plain acknowledgement message
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageData {
    #[schema(example = "User created successfully")]
    pub message: String,
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const UNSUPPORTED_IMAGE: i32 = 1002;
    pub const DUPLICATE_IDENTITY: i32 = 1003;
    pub const PAYLOAD_TOO_LARGE: i32 = 1004;

    // Auth errors (2xxx)
    pub const AUTH_FAILED: i32 = 2002;
    pub const UNAUTHENTICATED: i32 = 2003;
    pub const FORBIDDEN: i32 = 2004;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const MODEL_UNAVAILABLE: i32 = 5001;
    pub const PERSISTENCE_FAILURE: i32 = 5002;
    pub const INFERENCE_FAILURE: i32 = 5003;
}
