//! One conversational turn: classify the user's tone, fold it into the
//! context, let the dialog engine answer, and record the exchange.

use std::sync::Arc;

use tonebridge_core::chatlog::ChatLogEntry;
use tonebridge_core::conversation::{ConversationPayload, DialogResponse, MessageRequest};
use tonebridge_core::tone::{ToneMergePolicy, merge_tone, utterance_text};

use crate::chat_log::ChatLogStore;
use crate::clients::dialog::{DialogEngine, DialogError};
use crate::clients::tone::{self, ToneAnalyzer, ToneError};

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error(transparent)]
    Tone(#[from] ToneError),
    #[error(transparent)]
    Dialog(#[from] DialogError),
}

pub struct ConversationService {
    workspace_id: Option<String>,
    tone: Arc<dyn ToneAnalyzer>,
    dialog: Arc<dyn DialogEngine>,
    chat_log: Option<Arc<dyn ChatLogStore>>,
    policy: ToneMergePolicy,
}

impl ConversationService {
    pub fn new(
        workspace_id: Option<String>,
        tone: Arc<dyn ToneAnalyzer>,
        dialog: Arc<dyn DialogEngine>,
        policy: ToneMergePolicy,
    ) -> Self {
        Self {
            workspace_id,
            tone,
            dialog,
            chat_log: None,
            policy,
        }
    }

    pub fn with_chat_log(mut self, chat_log: Arc<dyn ChatLogStore>) -> Self {
        self.chat_log = Some(chat_log);
        self
    }

    pub fn workspace_configured(&self) -> bool {
        self.workspace_id.is_some()
    }

    /// Run one turn.
    ///
    /// Without a workspace the instructional response is returned and no
    /// upstream service is contacted. Tone classification always precedes
    /// the dialog call; a failed classification ends the turn.
    pub async fn handle_turn(&self, request: MessageRequest) -> Result<DialogResponse, TurnError> {
        let Some(workspace_id) = self.workspace_id.as_deref() else {
            tracing::debug!("No workspace configured, returning instructional response");
            return Ok(DialogResponse::instructional());
        };

        let mut payload = ConversationPayload::from_request(workspace_id, request);
        let text = utterance_text(payload.input.text.as_deref()).to_string();
        payload.input.text = Some(text);

        let classification =
            tone::classify(self.tone.as_ref(), payload.input.text.as_deref()).await?;
        merge_tone(&mut payload, &classification, &self.policy);

        let response = self.dialog.message(&payload).await?.with_confidence_message();
        tracing::info!(
            workspace_id = %payload.workspace_id,
            emotion = payload
                .context
                .as_ref()
                .and_then(|c| c.current_emotion())
                .unwrap_or_default(),
            intent = response.top_intent().map(|i| i.intent.as_str()).unwrap_or_default(),
            "Turn completed"
        );

        self.record(payload, response.clone());
        Ok(response)
    }

    /// Fire-and-forget write to the chat log (never blocks or fails the turn).
    fn record(&self, payload: ConversationPayload, response: DialogResponse) {
        let Some(store) = self.chat_log.clone() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = store.record(ChatLogEntry::new(payload, response)).await {
                tracing::warn!(error = %e, "Failed to record chat log entry");
            }
        });
    }
}
