use serde_json::{Value, json};
use tonebridge_core::auth::BasicCredentials;

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{}", serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string()));
    std::process::exit(4);
}

/// Exit code for an HTTP status.
///
/// 0=success (2xx), 1=client error (4xx), 2=server error (5xx)
pub fn exit_code_for(status: u16) -> i32 {
    match status {
        200..=299 => 0,
        400..=499 => 1,
        _ => 2,
    }
}

/// Execute an API request, print the response body, return a structured exit code.
///
/// JSON bodies are pretty-printed unless `raw`; anything else (CSV exports)
/// is printed verbatim. Exit code 3 means the server could not be reached.
pub async fn api_request(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    credentials: Option<&BasicCredentials>,
    body: Option<Value>,
    raw: bool,
) -> i32 {
    let url = match reqwest::Url::parse(&format!("{}{path}", api_url.trim_end_matches('/'))) {
        Ok(u) => u,
        Err(e) => exit_error(&format!("Invalid URL: {api_url}{path}: {e}"), None),
    };

    let mut req = client().request(method, url);
    if let Some(creds) = credentials {
        req = req.header("Authorization", creds.to_header());
    }
    if let Some(b) = body {
        req = req.json(&b);
    }

    let resp = match req.send().await {
        Ok(r) => r,
        Err(e) => {
            print_connection_error(&e);
            return 3;
        }
    };

    let status = resp.status().as_u16();
    let exit_code = exit_code_for(status);
    let text = match resp.text().await {
        Ok(t) => t,
        Err(e) => {
            print_connection_error(&e);
            return 3;
        }
    };

    let formatted = match serde_json::from_str::<Value>(&text) {
        Ok(v) if raw => v.to_string(),
        Ok(v) => serde_json::to_string_pretty(&v).unwrap_or(text),
        Err(_) => text,
    };

    if exit_code == 0 {
        println!("{formatted}");
    } else {
        eprintln!("{formatted}");
    }

    exit_code
}

pub fn print_connection_error(e: &reqwest::Error) {
    let err = json!({
        "error": "connection_error",
        "message": e.to_string(),
        "docs_hint": "Is the API server running? Check TONEBRIDGE_API_URL."
    });
    eprintln!("{err:#}");
}
