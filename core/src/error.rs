use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Structured error body returned by the API for failures it owns.
///
/// Errors relayed from the dialog engine are passed through verbatim and do
/// not use this shape.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "validation_failed", "tone_analysis_failed")
    pub error: String,
    /// Human-readable description of what went wrong
    pub message: String,
    /// Which field caused the error (if applicable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Request ID for tracing and debugging
    pub request_id: String,
    /// Hint about what the correct usage looks like
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const NOT_FOUND: &str = "not_found";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const TONE_ANALYSIS_FAILED: &str = "tone_analysis_failed";
    pub const INTERNAL_ERROR: &str = "internal_error";
}
