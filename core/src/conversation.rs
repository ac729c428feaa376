use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::tone::UserContext;

/// Placeholder value shipped in sample configuration; treated as unset.
pub const WORKSPACE_PLACEHOLDER: &str = "<workspace-id>";

/// Confidence at or above which the top intent is reported as understood.
pub const HIGH_CONFIDENCE: f64 = 0.75;
/// Confidence at or above which the top intent is reported as a guess.
pub const MEDIUM_CONFIDENCE: f64 = 0.5;

/// Text returned when no dialog workspace is configured.
pub const WORKSPACE_NOT_CONFIGURED_MESSAGE: &str = "The app has not been configured with a <b>WORKSPACE_ID</b> environment variable. \
Please set it to the identifier of the dialog workspace that should handle conversations. <br>\
Once a workspace has been defined, import its intents and restart the app to get a working application.";

/// User input for one turn. Fields other than `text` are forwarded untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Caller-owned conversation state, round-tripped on every turn.
///
/// Only `user` is interpreted here; everything else the dialog engine puts
/// in the context (`conversation_id`, `system`, ...) is carried through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserContext>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationContext {
    /// Context for a first turn: just an initialized user.
    pub fn for_new_user() -> Self {
        Self {
            user: Some(crate::tone::init_user()),
            extra: Map::new(),
        }
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.extra.get("conversation_id").and_then(Value::as_str)
    }

    pub fn current_emotion(&self) -> Option<&str> {
        self.user.as_ref()?.tone.emotion.current.as_deref()
    }
}

/// Inbound body of `POST /api/message`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub input: Option<MessageInput>,
    #[serde(default)]
    pub context: Option<ConversationContext>,
}

/// What the orchestrator owns for one turn and finally sends to the dialog engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationPayload {
    pub workspace_id: String,
    pub input: MessageInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ConversationContext>,
}

impl ConversationPayload {
    /// Build the payload for a turn. A request without context starts a new
    /// conversation with a freshly initialized user.
    pub fn from_request(workspace_id: impl Into<String>, request: MessageRequest) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            input: request.input.unwrap_or_default(),
            context: Some(
                request
                    .context
                    .unwrap_or_else(ConversationContext::for_new_user),
            ),
        }
    }
}

/// Body sent to the dialog engine's message endpoint.
#[derive(Debug, Serialize)]
pub struct DialogMessageRequest<'a> {
    pub input: &'a MessageInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<&'a ConversationContext>,
}

impl<'a> From<&'a ConversationPayload> for DialogMessageRequest<'a> {
    fn from(payload: &'a ConversationPayload) -> Self {
        Self {
            input: &payload.input,
            context: payload.context.as_ref(),
        }
    }
}

/// `output.text` is a list of lines from the engine, or a single string when
/// the text was synthesized from intent confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputText {
    One(String),
    Many(Vec<String>),
}

impl OutputText {
    pub fn joined(&self) -> String {
        match self {
            OutputText::One(text) => text.clone(),
            OutputText::Many(lines) => lines.join(" "),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            OutputText::One(text) => text.is_empty(),
            OutputText::Many(lines) => lines.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogOutput {
    /// Outer `None`: no `text` key at all. `Some(None)`: an explicit `null`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<Option<OutputText>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DialogOutput {
    pub fn text(&self) -> Option<&OutputText> {
        self.text.as_ref()?.as_ref()
    }
}

/// Wrap a present field in `Some`, so that `null` and absence stay distinct.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeIntent {
    pub intent: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeEntity {
    pub entity: String,
    #[serde(default)]
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of the dialog engine, relayed to the browser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<DialogOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intents: Option<Vec<RuntimeIntent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<RuntimeEntity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ConversationContext>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DialogResponse {
    /// Response used when no workspace is configured.
    pub fn instructional() -> Self {
        Self {
            output: Some(DialogOutput {
                text: Some(Some(OutputText::One(
                    WORKSPACE_NOT_CONFIGURED_MESSAGE.to_string(),
                ))),
                extra: Map::new(),
            }),
            ..Default::default()
        }
    }

    pub fn top_intent(&self) -> Option<&RuntimeIntent> {
        self.intents.as_deref()?.first()
    }

    pub fn top_entity(&self) -> Option<&RuntimeEntity> {
        self.entities.as_deref()?.first()
    }

    /// Fill in `output` from the top intent's confidence when the engine
    /// produced none. An engine-provided output is never touched. Without
    /// intents the synthesized text is `null`.
    pub fn with_confidence_message(mut self) -> Self {
        if self.output.is_none() {
            self.output = Some(DialogOutput {
                text: Some(self.top_intent().map(|i| OutputText::One(confidence_message(i)))),
                extra: Map::new(),
            });
        }
        self
    }
}

/// Human-readable message for an intent, by confidence band.
pub fn confidence_message(intent: &RuntimeIntent) -> String {
    if intent.confidence >= HIGH_CONFIDENCE {
        format!("I understood your intent was {}", intent.intent)
    } else if intent.confidence >= MEDIUM_CONFIDENCE {
        format!("I think your intent was {}", intent.intent)
    } else {
        "I did not understand your intent".to_string()
    }
}

/// Whether a configured workspace id actually names a workspace.
pub fn is_workspace_configured(workspace_id: Option<&str>) -> bool {
    matches!(workspace_id.map(str::trim), Some(id) if !id.is_empty() && id != WORKSPACE_PLACEHOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response_with_intent(confidence: f64) -> DialogResponse {
        serde_json::from_value(json!({
            "intents": [{ "intent": "greeting", "confidence": confidence }]
        }))
        .unwrap()
    }

    fn output_text(response: &DialogResponse) -> Option<String> {
        response
            .output
            .as_ref()
            .and_then(DialogOutput::text)
            .map(OutputText::joined)
    }

    #[test]
    fn confidence_bands_pick_the_right_message() {
        let high = response_with_intent(0.8).with_confidence_message();
        assert_eq!(
            output_text(&high).as_deref(),
            Some("I understood your intent was greeting")
        );

        let mid = response_with_intent(0.6).with_confidence_message();
        assert_eq!(output_text(&mid).as_deref(), Some("I think your intent was greeting"));

        let low = response_with_intent(0.3).with_confidence_message();
        assert_eq!(output_text(&low).as_deref(), Some("I did not understand your intent"));
    }

    #[test]
    fn confidence_band_edges_are_inclusive() {
        let at_high = response_with_intent(HIGH_CONFIDENCE).with_confidence_message();
        assert!(output_text(&at_high).unwrap().starts_with("I understood"));
        let at_mid = response_with_intent(MEDIUM_CONFIDENCE).with_confidence_message();
        assert!(output_text(&at_mid).unwrap().starts_with("I think"));
    }

    #[test]
    fn engine_output_is_left_untouched() {
        let response: DialogResponse = serde_json::from_value(json!({
            "output": { "text": ["Hi there", "How can I help?"], "nodes_visited": ["root"] },
            "intents": [{ "intent": "greeting", "confidence": 0.9 }]
        }))
        .unwrap();
        let response = response.with_confidence_message();
        assert_eq!(output_text(&response).as_deref(), Some("Hi there How can I help?"));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["output"]["nodes_visited"], json!(["root"]));
    }

    #[test]
    fn missing_output_without_intents_gets_null_text() {
        let response = DialogResponse::default().with_confidence_message();
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({ "output": { "text": null } }));
    }

    #[test]
    fn payload_without_context_starts_a_new_user() {
        let request: MessageRequest =
            serde_json::from_value(json!({ "input": { "text": "hi" } })).unwrap();
        let payload = ConversationPayload::from_request("ws-1", request);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "workspace_id": "ws-1",
                "input": { "text": "hi" },
                "context": { "user": { "tone": { "emotion": { "current": null } } } }
            })
        );
    }

    #[test]
    fn payload_keeps_supplied_context_as_is() {
        let request: MessageRequest = serde_json::from_value(json!({
            "input": { "text": "hi" },
            "context": { "conversation_id": "c-1" }
        }))
        .unwrap();
        let payload = ConversationPayload::from_request("ws-1", request);
        let context = payload.context.unwrap();
        assert!(context.user.is_none());
        assert_eq!(context.conversation_id(), Some("c-1"));
    }

    #[test]
    fn dialog_request_omits_workspace_id() {
        let payload = ConversationPayload::from_request("ws-1", MessageRequest::default());
        let body = serde_json::to_value(DialogMessageRequest::from(&payload)).unwrap();
        assert!(body.get("workspace_id").is_none());
        assert!(body.get("input").is_some());
        assert!(body.get("context").is_some());
    }

    #[test]
    fn workspace_placeholder_counts_as_unconfigured() {
        assert!(!is_workspace_configured(None));
        assert!(!is_workspace_configured(Some("")));
        assert!(!is_workspace_configured(Some("  ")));
        assert!(!is_workspace_configured(Some(WORKSPACE_PLACEHOLDER)));
        assert!(is_workspace_configured(Some("9f1c-workspace")));
    }

    #[test]
    fn unknown_response_fields_survive_a_round_trip() {
        let raw = json!({
            "input": { "text": "hi" },
            "intents": [],
            "entities": [],
            "output": { "text": ["hello"] },
            "context": { "conversation_id": "c-9", "system": { "dialog_turn_counter": 1 } },
            "alternate_intents": false
        });
        let response: DialogResponse = serde_json::from_value(raw.clone()).unwrap();
        let relayed = response.with_confidence_message();
        assert_eq!(serde_json::to_value(&relayed).unwrap(), raw);
    }

    #[test]
    fn engine_output_without_text_is_relayed_unchanged() {
        let raw = json!({
            "intents": [],
            "entities": [],
            "output": { "nodes_visited": ["n1"] }
        });
        let response: DialogResponse = serde_json::from_value(raw.clone()).unwrap();
        let relayed = response.with_confidence_message();
        assert_eq!(serde_json::to_value(&relayed).unwrap(), raw);

        let raw = json!({ "output": { "text": null, "nodes_visited": ["n1"] } });
        let response: DialogResponse = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&response).unwrap(), raw);
    }

    #[test]
    fn empty_intent_list_still_gets_null_text() {
        let response: DialogResponse =
            serde_json::from_value(json!({ "intents": [], "entities": [] })).unwrap();
        let value = serde_json::to_value(response.with_confidence_message()).unwrap();
        assert_eq!(
            value,
            json!({ "intents": [], "entities": [], "output": { "text": null } })
        );
    }
}
