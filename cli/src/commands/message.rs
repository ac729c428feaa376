use serde_json::{Value, json};

use crate::util::{api_request, exit_error};

/// Request body for one turn. `context` is passed through untouched.
pub fn message_body(text: Option<&str>, context: Option<Value>) -> Value {
    let mut body = json!({});
    if let Some(text) = text {
        body["input"] = json!({ "text": text });
    }
    if let Some(context) = context {
        body["context"] = context;
    }
    body
}

pub async fn run(api_url: &str, text: Option<&str>, context: Option<&str>, raw: bool) -> i32 {
    let context = context.map(|raw_context| {
        serde_json::from_str::<Value>(raw_context).unwrap_or_else(|e| {
            exit_error(
                &format!("Invalid JSON in --context: {e}"),
                Some("Pass the `context` object returned by the previous turn."),
            )
        })
    });

    api_request(
        api_url,
        reqwest::Method::POST,
        "/api/message",
        None,
        Some(message_body(text, context)),
        raw,
    )
    .await
}
