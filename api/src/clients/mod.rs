//! Outbound clients for the tone service and the dialog engine.

pub mod dialog;
pub mod tone;

use std::time::Duration;

use reqwest::Url;
use serde_json::{Value, json};

use crate::config::ServiceEndpoint;

/// Shared HTTP client for all upstream calls.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("tonebridge/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// `base` with `segments` appended to its path.
fn endpoint_url(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// POST `body` as JSON to an upstream endpoint with its version and credentials applied.
fn post_json<B: serde::Serialize + ?Sized>(
    http: &reqwest::Client,
    endpoint: &ServiceEndpoint,
    segments: &[&str],
    body: &B,
) -> reqwest::RequestBuilder {
    let request = http
        .post(endpoint_url(&endpoint.url, segments))
        .query(&[("version", endpoint.version.as_str())])
        .json(body);
    match &endpoint.credentials {
        Some(creds) => request.basic_auth(&creds.username, Some(&creds.password)),
        None => request,
    }
}

/// Error body of a failed upstream response: its JSON when it has one,
/// otherwise the raw text wrapped as `{"error": ...}`.
async fn error_body(response: reqwest::Response) -> Value {
    let status = response.status();
    match response.bytes().await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            let text = String::from_utf8_lossy(&bytes);
            let text = if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("upstream error").to_string()
            } else {
                text.into_owned()
            };
            json!({ "error": text, "code": status.as_u16() })
        }),
        Err(err) => json!({ "error": err.to_string(), "code": status.as_u16() }),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_appends_segments_without_double_slashes() {
        let base = Url::parse("https://example.test/assistant/api/").unwrap();
        let url = endpoint_url(&base, &["v1", "workspaces", "ws 1", "message"]);
        assert_eq!(
            url.as_str(),
            "https://example.test/assistant/api/v1/workspaces/ws%201/message"
        );

        let base = Url::parse("https://example.test/tone-analyzer/api").unwrap();
        let url = endpoint_url(&base, &["v3", "tone_chat"]);
        assert_eq!(url.as_str(), "https://example.test/tone-analyzer/api/v3/tone_chat");
    }
}
