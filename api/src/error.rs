use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tonebridge_core::error::{self, ApiError};

use crate::chat_log::StoreError;
use crate::clients::dialog::DialogError;
use crate::clients::tone::ToneError;
use crate::conversation::TurnError;

/// Internal error type that converts to API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        docs_hint: Option<String>,
    },
    /// Missing or wrong Basic credentials (401)
    Unauthorized {
        message: String,
        docs_hint: Option<String>,
    },
    /// Resource does not exist (404)
    NotFound { resource: String },
    /// Tone service failed; the turn cannot continue (502)
    ToneAnalysis(ToneError),
    /// Dialog engine failed; relayed verbatim with its own status (default 500)
    Upstream(DialogError),
    /// Chat log store failure (500)
    Store(StoreError),
}

fn api_error(code: &str, message: String) -> ApiError {
    ApiError {
        error: code.to_string(),
        message,
        field: None,
        request_id: uuid::Uuid::now_v7().to_string(),
        docs_hint: None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation {
                message,
                field,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    field,
                    docs_hint,
                    ..api_error(error::codes::VALIDATION_FAILED, message)
                },
            ),
            AppError::Unauthorized { message, docs_hint } => {
                let mut response = (
                    StatusCode::UNAUTHORIZED,
                    Json(ApiError {
                        docs_hint,
                        ..api_error(error::codes::UNAUTHORIZED, message)
                    }),
                )
                    .into_response();
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Basic realm=\"chat-logs\""),
                );
                return response;
            }
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                api_error(error::codes::NOT_FOUND, format!("{resource} not found")),
            ),
            AppError::ToneAnalysis(err) => {
                tracing::error!(error = %err, "Tone analysis failed");
                (
                    StatusCode::BAD_GATEWAY,
                    ApiError {
                        docs_hint: Some(
                            "The tone service could not classify the message. Retry the turn with the same context."
                                .to_string(),
                        ),
                        ..api_error(error::codes::TONE_ANALYSIS_FAILED, err.to_string())
                    },
                )
            }
            AppError::Upstream(err) => {
                tracing::error!(error = %err, status = ?err.status_code(), "Dialog engine failed");
                let status = err
                    .status_code()
                    .and_then(|code| StatusCode::from_u16(code).ok())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                return (status, Json(err.body())).into_response();
            }
            AppError::Store(err) => {
                tracing::error!(error = %err, "Chat log store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    api_error(
                        error::codes::INTERNAL_ERROR,
                        "An internal error occurred".to_string(),
                    ),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<TurnError> for AppError {
    fn from(err: TurnError) -> Self {
        match err {
            TurnError::Tone(err) => AppError::ToneAnalysis(err),
            TurnError::Dialog(err) => AppError::Upstream(err),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}
