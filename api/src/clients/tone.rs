use async_trait::async_trait;
use serde_json::Value;
use tonebridge_core::tone::{ToneChatRequest, ToneClassificationResult, utterance_text};

use super::{error_body, post_json};
use crate::config::ServiceEndpoint;

#[derive(Debug, thiserror::Error)]
pub enum ToneError {
    #[error("tone service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("tone service returned status {status}")]
    Status { status: u16, body: Value },
    #[error("tone service response could not be decoded: {0}")]
    Decode(String),
}

/// Emotion classification of chat utterances.
#[async_trait]
pub trait ToneAnalyzer: Send + Sync {
    /// Classify the utterances in `request`. One network call, no retry.
    async fn tone_chat(
        &self,
        request: &ToneChatRequest,
    ) -> Result<ToneClassificationResult, ToneError>;
}

/// Classify a single user utterance.
///
/// Missing or blank text is replaced by the `<empty>` sentinel so the
/// service always receives a non-empty utterance.
pub async fn classify(
    analyzer: &dyn ToneAnalyzer,
    text: Option<&str>,
) -> Result<ToneClassificationResult, ToneError> {
    let request = ToneChatRequest::for_text(utterance_text(text));
    analyzer.tone_chat(&request).await
}

/// Tone Analyzer v3 `tone_chat` over HTTP.
pub struct WatsonToneAnalyzer {
    http: reqwest::Client,
    endpoint: ServiceEndpoint,
}

impl WatsonToneAnalyzer {
    pub fn new(http: reqwest::Client, endpoint: ServiceEndpoint) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl ToneAnalyzer for WatsonToneAnalyzer {
    async fn tone_chat(
        &self,
        request: &ToneChatRequest,
    ) -> Result<ToneClassificationResult, ToneError> {
        let response = post_json(&self.http, &self.endpoint, &["v3", "tone_chat"], request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Tone service returned non-success status");
            return Err(ToneError::Status {
                status: status.as_u16(),
                body: error_body(response).await,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ToneError::Decode(e.to_string()))
    }
}
