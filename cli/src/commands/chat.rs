use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::message::message_body;
use crate::util::{client, exit_code_for, print_connection_error};

/// What to show for one turn: the reply text and the emotion the server detected.
pub fn render_turn(response: &Value) -> String {
    let text = match &response["output"]["text"] {
        Value::String(s) => s.clone(),
        Value::Array(lines) => lines
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    };
    match response["context"]["user"]["tone"]["emotion"]["current"].as_str() {
        Some(emotion) => format!("[{emotion}] {text}"),
        None => text,
    }
}

/// Interactive session: each stdin line is one turn; the context returned by
/// the server is sent back with the next line. Ends on EOF or `/quit`.
pub async fn run(api_url: &str) -> i32 {
    let url = format!("{}/api/message", api_url.trim_end_matches('/'));
    let http = client();
    let mut context: Option<Value> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    // Empty first turn lets the dialog engine greet.
    let mut next: Option<String> = Some(String::new());

    while let Some(line) = next.take() {
        let text = line.trim();
        if text == "/quit" {
            break;
        }

        let resp = match http
            .post(&url)
            .json(&message_body(Some(text), context.clone()))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                print_connection_error(&e);
                return 3;
            }
        };

        let status = resp.status().as_u16();
        let body: Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                print_connection_error(&e);
                return 3;
            }
        };
        if exit_code_for(status) != 0 {
            eprintln!("{body:#}");
            return exit_code_for(status);
        }

        if let Some(ctx) = body.get("context").filter(|c| c.is_object()) {
            context = Some(ctx.clone());
        }
        let rendered = format!("{}\n> ", render_turn(&body));
        if stdout.write_all(rendered.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            return 3;
        }

        next = match lines.next_line().await {
            Ok(line) => line,
            Err(_) => None,
        };
    }

    0
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn render_shows_emotion_and_joined_lines() {
        let response = json!({
            "output": { "text": ["Sorry to hear that.", "How can I help?"] },
            "context": { "user": { "tone": { "emotion": { "current": "sad" } } } }
        });
        assert_eq!(render_turn(&response), "[sad] Sorry to hear that. How can I help?");
    }

    #[test]
    fn render_handles_missing_output_and_emotion() {
        assert_eq!(render_turn(&json!({ "output": { "text": null } })), "");
        assert_eq!(
            render_turn(&json!({ "output": { "text": "I think your intent was billing" } })),
            "I think your intent was billing"
        );
    }
}
