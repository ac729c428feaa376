use async_trait::async_trait;
use serde_json::{Value, json};
use tonebridge_core::conversation::{ConversationPayload, DialogMessageRequest, DialogResponse};

use super::{error_body, post_json};
use crate::config::ServiceEndpoint;

#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("dialog engine request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("dialog engine returned status {status}")]
    Status { status: u16, body: Value },
    #[error("dialog engine response could not be decoded: {0}")]
    Decode(String),
}

impl DialogError {
    /// Status reported by the engine, if it answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DialogError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Body relayed to the caller: the engine's own error document when there
    /// is one, otherwise a minimal `{error, code}` object.
    pub fn body(&self) -> Value {
        match self {
            DialogError::Status { body, .. } => body.clone(),
            other => json!({ "error": other.to_string(), "code": 500 }),
        }
    }
}

/// The dialog engine that turns user input plus context into a reply.
#[async_trait]
pub trait DialogEngine: Send + Sync {
    async fn message(&self, payload: &ConversationPayload) -> Result<DialogResponse, DialogError>;
}

/// Assistant v1 `message` over HTTP.
pub struct WatsonAssistant {
    http: reqwest::Client,
    endpoint: ServiceEndpoint,
}

impl WatsonAssistant {
    pub fn new(http: reqwest::Client, endpoint: ServiceEndpoint) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl DialogEngine for WatsonAssistant {
    async fn message(&self, payload: &ConversationPayload) -> Result<DialogResponse, DialogError> {
        let response = post_json(
            &self.http,
            &self.endpoint,
            &["v1", "workspaces", payload.workspace_id.as_str(), "message"],
            &DialogMessageRequest::from(payload),
        )
        .send()
        .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DialogError::Status {
                status: status.as_u16(),
                body: error_body(response).await,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| DialogError::Decode(e.to_string()))
    }
}
