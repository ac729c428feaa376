use axum::extract::State;
use axum::{Json, Router, routing::post};
use tonebridge_core::conversation::{DialogResponse, MessageRequest};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/message", post(send_message))
}

/// Relay one user turn to the dialog engine, annotated with the detected emotion.
///
/// The returned `context` must be sent back unchanged with the next turn.
#[utoipa::path(
    post,
    path = "/api/message",
    request_body(content = serde_json::Value, description = "`{ input: { text }, context }`; both fields optional"),
    responses(
        (status = 200, description = "Dialog engine response, or setup instructions when no workspace is configured", body = serde_json::Value),
        (status = 400, description = "Malformed request body", body = tonebridge_core::error::ApiError),
        (status = 502, description = "Tone service failed", body = tonebridge_core::error::ApiError),
        (status = "5XX", description = "Dialog engine error body, relayed with its status", body = serde_json::Value)
    ),
    tag = "conversation"
)]
pub async fn send_message(
    State(state): State<AppState>,
    AppJson(request): AppJson<MessageRequest>,
) -> Result<Json<DialogResponse>, AppError> {
    let response = state.conversation.handle_turn(request).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tonebridge_core::tone::ToneMergePolicy;
    use tower::ServiceExt;

    use super::*;
    use crate::conversation::ConversationService;
    use crate::conversation::fakes::{FakeDialog, FakeTone};

    fn app(workspace_id: Option<&str>, tone: Arc<FakeTone>, dialog: Arc<FakeDialog>) -> Router {
        let conversation = ConversationService::new(
            workspace_id.map(str::to_string),
            tone,
            dialog,
            ToneMergePolicy::default(),
        );
        router().with_state(AppState {
            conversation: Arc::new(conversation),
            chat_log: None,
            log_credentials: None,
        })
    }

    async fn post_message(app: Router, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/message")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn unconfigured_workspace_answers_with_instructions() {
        let app = app(None, FakeTone::tones(json!([])), FakeDialog::replying(json!({})));
        let (status, body) = post_message(app, r#"{"input":{"text":"hi"}}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["output"]["text"].as_str().unwrap().contains("WORKSPACE_ID"));
    }

    #[tokio::test]
    async fn successful_turn_returns_dialog_response_with_emotion() {
        let app = app(
            Some("ws-1"),
            FakeTone::tones(json!([{ "tone_id": "impolite", "score": 0.8 }])),
            FakeDialog::replying(json!({
                "intents": [{ "intent": "billing", "confidence": 0.6 }],
                "context": {
                    "conversation_id": "c-1",
                    "user": { "tone": { "emotion": { "current": "impolite" } } }
                }
            })),
        );
        let (status, body) = post_message(app, r#"{"input":{"text":"fix my bill now"}}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["output"]["text"], "I think your intent was billing");
        assert_eq!(body["context"]["user"]["tone"]["emotion"]["current"], "impolite");
        assert_eq!(body["context"]["conversation_id"], "c-1");
    }

    #[tokio::test]
    async fn tone_failure_is_a_bad_gateway() {
        let app = app(Some("ws-1"), FakeTone::failing(500), FakeDialog::replying(json!({})));
        let (status, body) = post_message(app, r#"{"input":{"text":"hi"}}"#).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "tone_analysis_failed");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn dialog_error_keeps_upstream_status_and_body() {
        let upstream = json!({ "error": "Unauthorized", "code": 401 });
        let app = app(
            Some("ws-1"),
            FakeTone::tones(json!([])),
            FakeDialog::failing(401, upstream.clone()),
        );
        let (status, body) = post_message(app, r#"{"input":{"text":"hi"}}"#).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, upstream);
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = app(Some("ws-1"), FakeTone::tones(json!([])), FakeDialog::replying(json!({})));
        let (status, body) = post_message(app, r#"{"input":"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
    }
}
