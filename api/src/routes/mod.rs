pub mod chats;
pub mod health;
pub mod message;

use std::path::Path;

use axum::routing::get;
use axum::{Json, Router};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware;
use crate::state::AppState;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    Json(crate::ApiDoc::openapi())
}

/// Assemble the full application router.
///
/// Log export routes exist only when a chat log store is configured. Any
/// path not matched by the API falls through to the static chat UI.
pub fn app(state: AppState, static_dir: Option<&Path>, cors_origins: &[String]) -> Router {
    let mut router = Router::new()
        .merge(health::router())
        .merge(message::router())
        .route("/api-doc/openapi.json", get(openapi_json));

    if state.chat_log.is_some() {
        router = router.merge(chats::router());
    }

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(axum::middleware::from_fn(middleware::security_headers::apply))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .option_layer(middleware::cors::build_cors_layer(cors_origins)),
        )
        .with_state(state)
}
