use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

/// Build a CORS layer for the configured browser origins.
///
/// Returns `None` when no origin is configured, in which case the chat UI is
/// expected to be served from the same origin as the API.
pub fn build_cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                HeaderName::from_static("authorization"),
                HeaderName::from_static("content-type"),
            ])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600)),
    )
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn no_origins_means_no_layer() {
        assert!(build_cors_layer(&[]).is_none());
        assert!(build_cors_layer(&["bad\norigin".to_string()]).is_none());
    }

    #[tokio::test]
    async fn configured_origin_is_allowed() {
        let layer = build_cors_layer(&["http://chat.test".to_string()]).unwrap();
        let app = Router::new()
            .route("/api/message", post(|| async { StatusCode::OK }))
            .layer(layer);

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/message")
                    .header("origin", "http://chat.test")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .expect("allow-origin header should exist"),
            "http://chat.test"
        );
    }
}
