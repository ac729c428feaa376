//! Chat log records and their tabular export.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::conversation::{ConversationPayload, DialogOutput, DialogResponse};

/// Column headers of the exported chat table, in order.
pub const EXPORT_HEADER: [&str; 8] = [
    "Id",
    "Question",
    "Intent",
    "Confidence",
    "Entity",
    "Emotion",
    "Output",
    "Time",
];

pub const NO_INTENT: &str = "<no intent>";
pub const NO_ENTITY: &str = "<no entity>";
pub const NO_DIALOG: &str = "<no dialog>";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// One recorded conversational turn: what was sent to the dialog engine and
/// what was relayed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLogEntry {
    pub id: Uuid,
    pub request: ConversationPayload,
    pub response: DialogResponse,
    pub time: DateTime<Utc>,
}

impl ChatLogEntry {
    pub fn new(request: ConversationPayload, response: DialogResponse) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            response,
            time: Utc::now(),
        }
    }
}

/// A flattened view of a [`ChatLogEntry`], one value per export column.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatExportRow {
    pub conversation_id: String,
    pub question: String,
    pub intent: String,
    pub confidence: f64,
    pub entity: String,
    pub emotion: String,
    pub output: String,
    pub time: String,
}

impl From<&ChatLogEntry> for ChatExportRow {
    fn from(entry: &ChatLogEntry) -> Self {
        let response = &entry.response;
        let context = response.context.as_ref();

        let (intent, confidence) = match response.top_intent() {
            Some(top) => (top.intent.clone(), top.confidence),
            None => (NO_INTENT.to_string(), 0.0),
        };
        let entity = response
            .top_entity()
            .map(|e| format!("{} : {}", e.entity, e.value))
            .unwrap_or_else(|| NO_ENTITY.to_string());
        let output = response
            .output
            .as_ref()
            .and_then(DialogOutput::text)
            .filter(|t| !t.is_empty())
            .map(|t| t.joined())
            .unwrap_or_else(|| NO_DIALOG.to_string());

        Self {
            conversation_id: context
                .and_then(|c| c.conversation_id())
                .unwrap_or_default()
                .to_string(),
            question: entry.request.input.text.clone().unwrap_or_default(),
            intent,
            confidence,
            entity,
            emotion: context
                .and_then(|c| c.current_emotion())
                .unwrap_or_default()
                .to_string(),
            output,
            time: entry.time.format(TIME_FORMAT).to_string(),
        }
    }
}

impl ChatExportRow {
    fn cells(&self) -> [Cow<'_, str>; 8] {
        [
            Cow::Borrowed(&self.conversation_id),
            Cow::Borrowed(&self.question),
            Cow::Borrowed(&self.intent),
            Cow::Owned(self.confidence.to_string()),
            Cow::Borrowed(&self.entity),
            Cow::Borrowed(&self.emotion),
            Cow::Borrowed(&self.output),
            Cow::Borrowed(&self.time),
        ]
    }

    pub fn to_json_row(&self) -> Value {
        json!([
            self.conversation_id,
            self.question,
            self.intent,
            self.confidence,
            self.entity,
            self.emotion,
            self.output,
            self.time,
        ])
    }
}

/// Export rows for `entries`, oldest turn first.
pub fn export_rows(entries: &[ChatLogEntry]) -> Vec<ChatExportRow> {
    let mut sorted: Vec<&ChatLogEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.time);
    sorted.into_iter().map(ChatExportRow::from).collect()
}

/// Header row followed by one JSON array per turn.
pub fn to_json_table(rows: &[ChatExportRow]) -> Value {
    let mut table = Vec::with_capacity(rows.len() + 1);
    table.push(json!(EXPORT_HEADER));
    table.extend(rows.iter().map(ChatExportRow::to_json_row));
    Value::Array(table)
}

/// RFC 4180 CSV with a header line and CRLF line endings.
pub fn to_csv(rows: &[ChatExportRow]) -> String {
    let mut out = String::new();
    push_record(&mut out, EXPORT_HEADER.iter().map(|h| Cow::Borrowed(*h)));
    for row in rows {
        push_record(&mut out, row.cells().into_iter());
    }
    out
}

fn push_record<'a>(out: &mut String, cells: impl Iterator<Item = Cow<'a, str>>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&csv_field(&cell));
    }
    out.push_str("\r\n");
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
