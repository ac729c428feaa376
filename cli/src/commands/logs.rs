use tonebridge_core::auth::BasicCredentials;

use crate::util::{api_request, exit_error};

fn require_credentials(user: Option<String>, password: Option<String>) -> BasicCredentials {
    match (user, password) {
        (Some(user), Some(password)) => BasicCredentials::new(user, password),
        _ => exit_error(
            "Chat log access needs Basic credentials",
            Some("Set --log-user/--log-pass or TONEBRIDGE_LOG_USER/TONEBRIDGE_LOG_PASS."),
        ),
    }
}

pub async fn export(
    api_url: &str,
    user: Option<String>,
    password: Option<String>,
    csv: bool,
) -> i32 {
    let credentials = require_credentials(user, password);
    let path = if csv { "/chats?format=csv" } else { "/chats" };
    api_request(api_url, reqwest::Method::GET, path, Some(&credentials), None, false).await
}

pub async fn clear(api_url: &str, user: Option<String>, password: Option<String>) -> i32 {
    let credentials = require_credentials(user, password);
    api_request(
        api_url,
        reqwest::Method::POST,
        "/clearDb",
        Some(&credentials),
        None,
        false,
    )
    .await
}
