use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get, routing::post};
use serde::{Deserialize, Serialize};
use tonebridge_core::chatlog::{export_rows, to_csv, to_json_table};

use crate::auth::LogAdmin;
use crate::chat_log::ChatLogStore;
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chats", get(export_chats))
        .route("/clearDb", post(clear_chats))
}

#[derive(Debug, Default, Clone, Copy, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportParams {
    /// `json` (default) or `csv`
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ClearLogsResponse {
    pub message: String,
}

fn store(state: &AppState) -> Result<&Arc<dyn ChatLogStore>, AppError> {
    state.chat_log.as_ref().ok_or_else(|| AppError::NotFound {
        resource: "Chat log".to_string(),
    })
}

/// Export every recorded turn as a table, header row first, oldest turn first.
#[utoipa::path(
    get,
    path = "/chats",
    params(ExportParams),
    responses(
        (status = 200, description = "Array of rows (JSON) or text/csv", body = serde_json::Value),
        (status = 401, description = "Missing or invalid Basic credentials", body = tonebridge_core::error::ApiError)
    ),
    security(("basic_auth" = [])),
    tag = "chat-log"
)]
pub async fn export_chats(
    admin: LogAdmin,
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let entries = store(&state)?.list().await?;
    let rows = export_rows(&entries);
    tracing::info!(user = %admin.user, rows = rows.len(), format = ?params.format, "Exporting chat log");

    Ok(match params.format {
        ExportFormat::Json => Json(to_json_table(&rows)).into_response(),
        ExportFormat::Csv => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"chats.csv\""),
            ],
            to_csv(&rows),
        )
            .into_response(),
    })
}

/// Delete every recorded turn.
#[utoipa::path(
    post,
    path = "/clearDb",
    responses(
        (status = 200, description = "Chat log cleared", body = ClearLogsResponse),
        (status = 401, description = "Missing or invalid Basic credentials", body = tonebridge_core::error::ApiError)
    ),
    security(("basic_auth" = [])),
    tag = "chat-log"
)]
pub async fn clear_chats(
    admin: LogAdmin,
    State(state): State<AppState>,
) -> Result<Json<ClearLogsResponse>, AppError> {
    store(&state)?.clear().await?;
    tracing::info!(user = %admin.user, "Chat log cleared");
    Ok(Json(ClearLogsResponse {
        message: "Clearing db".to_string(),
    }))
}
