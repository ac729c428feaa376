use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::conversation::{ConversationContext, ConversationPayload};

/// Utterance submitted to the tone service when the user sent no usable text.
/// The service rejects empty utterances.
pub const EMPTY_UTTERANCE: &str = "<empty>";

/// Label written to the context when no tone was detected for the turn.
pub const NO_TONE: &str = "none";

/// Speaker role attached to every utterance submitted for classification.
pub const CUSTOMER_ROLE: &str = "customer";

/// Minimum score for a primary emotion to count as meaningful.
/// Only consulted when a [`ToneMergePolicy`] opts into thresholding.
pub const PRIMARY_EMOTION_SCORE_THRESHOLD: f64 = 0.5;

/// One utterance in a `tone_chat` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Utterance {
    pub text: String,
    pub user: String,
}

/// Request body for the tone service. Always carries exactly one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ToneChatRequest {
    pub utterances: Vec<Utterance>,
}

impl ToneChatRequest {
    pub fn for_text(text: &str) -> Self {
        Self {
            utterances: vec![Utterance {
                text: text.to_string(),
                user: CUSTOMER_ROLE.to_string(),
            }],
        }
    }
}

/// Text to submit for classification: the user's text unchanged, or
/// [`EMPTY_UTTERANCE`] when it is missing or blank.
pub fn utterance_text(text: Option<&str>) -> &str {
    match text {
        Some(t) if !t.trim().is_empty() => t,
        _ => EMPTY_UTTERANCE,
    }
}

/// A single detected tone. The service reports `tone_id`; `id` is accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ToneScore {
    #[serde(alias = "id")]
    pub tone_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone_name: Option<String>,
    #[serde(default)]
    pub score: f64,
}

/// Tones detected for one submitted utterance, ordered by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UtteranceTone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utterance_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utterance_text: Option<String>,
    #[serde(default)]
    pub tones: Vec<ToneScore>,
}

/// Response body of the tone service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ToneClassificationResult {
    pub utterances_tone: Vec<UtteranceTone>,
}

impl ToneClassificationResult {
    /// Tones of the first (and only) utterance we submitted.
    pub fn first_utterance_tones(&self) -> &[ToneScore] {
        self.utterances_tone
            .first()
            .map(|u| u.tones.as_slice())
            .unwrap_or(&[])
    }
}

/// `context.user.tone.emotion`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionTone {
    /// `None` before the first classification, then `"none"` or a tone id.
    pub current: Option<String>,
    /// Past labels, oldest first. Only grows when history is enabled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `context.user.tone`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToneProfile {
    #[serde(default)]
    pub emotion: EmotionTone,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `context.user`: the per-user slice of the round-tripped context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub tone: ToneProfile,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fresh user context with no detected emotion.
pub fn init_user() -> UserContext {
    UserContext::default()
}

/// How a classification result is folded into the context.
///
/// The default reproduces the plain behaviour: the first tone reported by
/// the service wins regardless of score, and only the current label is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToneMergePolicy {
    /// When set, skip tones scoring below this value.
    pub score_threshold: Option<f64>,
    /// Append every selected label to `emotion.history`.
    pub maintain_history: bool,
}

impl ToneMergePolicy {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    pub fn with_history(mut self, maintain_history: bool) -> Self {
        self.maintain_history = maintain_history;
        self
    }

    /// Pick the label for a tone list. Order is trusted; nothing is re-sorted.
    pub fn select_label<'a>(&self, tones: &'a [ToneScore]) -> &'a str {
        let selected = match self.score_threshold {
            Some(threshold) => tones.iter().find(|t| t.score >= threshold),
            None => tones.first(),
        };
        selected.map(|t| t.tone_id.as_str()).unwrap_or(NO_TONE)
    }
}

/// Write the dominant emotion of `result` into
/// `payload.context.user.tone.emotion.current`, creating the context and the
/// user object when absent. Overwrites any previous label.
pub fn merge_tone<'a>(
    payload: &'a mut ConversationPayload,
    result: &ToneClassificationResult,
    policy: &ToneMergePolicy,
) -> &'a mut ConversationPayload {
    let label = policy.select_label(result.first_utterance_tones()).to_string();

    let context = payload
        .context
        .get_or_insert_with(ConversationContext::default);
    let emotion = &mut context.user.get_or_insert_with(init_user).tone.emotion;

    if policy.maintain_history {
        emotion.history.push(label.clone());
    }
    emotion.current = Some(label);

    payload
}
