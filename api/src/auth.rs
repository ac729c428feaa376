//! HTTP Basic authentication for the chat log routes.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use tonebridge_core::auth::BasicCredentials;

use crate::error::AppError;
use crate::state::AppState;

const BASIC_AUTH_HINT: &str =
    "Include 'Authorization: Basic <base64(user:password)>' using LOG_USER and LOG_PASS.";

/// Proof that the caller presented the configured log credentials.
#[derive(Debug, Clone)]
pub struct LogAdmin {
    pub user: String,
}

impl FromRequestParts<AppState> for LogAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = |message: &str| AppError::Unauthorized {
            message: message.to_string(),
            docs_hint: Some(BASIC_AUTH_HINT.to_string()),
        };

        let expected = state
            .log_credentials
            .as_ref()
            .ok_or_else(|| unauthorized("Chat log access is not configured"))?;

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let credentials = BasicCredentials::from_header(header_value)
            .map_err(|e| unauthorized(&format!("Invalid Authorization header: {e}")))?;

        if !expected.matches(&credentials) {
            tracing::warn!(user = %credentials.user, "Rejected chat log credentials");
            return Err(unauthorized("Invalid credentials"));
        }

        Ok(LogAdmin {
            user: credentials.user,
        })
    }
}
