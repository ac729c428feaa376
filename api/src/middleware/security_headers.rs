use axum::extract::Request;
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;

/// Baseline security headers on every response.
///
/// Chat log exports additionally get `cache-control: no-store`: they contain
/// user messages and must not linger in shared caches.
pub async fn apply(req: Request, next: Next) -> Response {
    let sensitive = req.uri().path().starts_with("/chats");
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    if sensitive {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }
    response
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::{Router, middleware};
    use tower::ServiceExt;

    async fn ok() -> StatusCode {
        StatusCode::OK
    }

    fn app() -> Router {
        Router::new()
            .route("/health", get(ok))
            .route("/chats", get(ok))
            .layer(middleware::from_fn(super::apply))
    }

    async fn get_headers(uri: &str) -> axum::http::HeaderMap {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .expect("request should succeed")
            .headers()
            .clone()
    }

    #[tokio::test]
    async fn every_response_gets_baseline_headers() {
        let headers = get_headers("/health").await;
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
        assert!(headers.get("cache-control").is_none());
    }

    #[tokio::test]
    async fn chat_exports_are_not_cacheable() {
        let headers = get_headers("/chats").await;
        assert_eq!(headers["cache-control"], "no-store");
    }
}
