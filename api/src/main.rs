use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;
use tonebridge_core::auth::ExpectedCredentials;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

mod auth;
mod chat_log;
mod clients;
mod config;
mod conversation;
mod error;
mod extract;
mod middleware;
mod routes;
mod state;

use chat_log::{ChatLogStore, InMemoryChatLog, PgChatLog};
use clients::dialog::WatsonAssistant;
use clients::tone::WatsonToneAnalyzer;
use config::{AppConfig, ChatLogBackend};
use conversation::ConversationService;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tonebridge API",
        version = "0.1.0",
        description = "Chat relay that tags every user turn with its detected emotion before the dialog engine answers."
    ),
    paths(
        routes::health::health_check,
        routes::message::send_message,
        routes::chats::export_chats,
        routes::chats::clear_chats,
    ),
    components(schemas(
        HealthResponse,
        tonebridge_core::error::ApiError,
        routes::chats::ExportFormat,
        routes::chats::ClearLogsResponse,
    )),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "basic_auth",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Basic,
                ),
            ),
        );
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub workspace_configured: bool,
    /// `memory`, `postgres` or `disabled`
    pub chat_log: String,
}

async fn open_chat_log(
    backend: &ChatLogBackend,
) -> Result<Option<Arc<dyn ChatLogStore>>, chat_log::StoreError> {
    let store: Arc<dyn ChatLogStore> = match backend {
        ChatLogBackend::Disabled => return Ok(None),
        ChatLogBackend::Memory => Arc::new(InMemoryChatLog::new()),
        ChatLogBackend::Postgres { database_url } => Arc::new(PgChatLog::connect(database_url).await?),
    };
    Ok(Some(store))
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tonebridge_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    if config.workspace_id.is_none() {
        tracing::warn!("WORKSPACE_ID is not set; /api/message will only return setup instructions");
    }

    let http = clients::http_client(config.upstream_timeout).expect("Failed to build HTTP client");

    let chat_log = open_chat_log(&config.chat_log)
        .await
        .expect("Failed to open chat log store");

    let mut conversation = ConversationService::new(
        config.workspace_id.clone(),
        Arc::new(WatsonToneAnalyzer::new(http.clone(), config.tone_analyzer.clone())),
        Arc::new(WatsonAssistant::new(http, config.assistant.clone())),
        config.tone_policy.clone(),
    );
    if let Some(store) = &chat_log {
        tracing::info!(backend = store.backend(), "Chat log enabled");
        conversation = conversation.with_chat_log(Arc::clone(store));
    }

    let app_state = state::AppState {
        conversation: Arc::new(conversation),
        chat_log,
        log_credentials: config
            .log_credentials
            .as_ref()
            .map(|c| ExpectedCredentials::new(&c.user, &c.password)),
    };

    let static_dir = config.static_dir.is_dir().then_some(config.static_dir.as_path());
    if static_dir.is_none() {
        tracing::warn!(dir = %config.static_dir.display(), "Static directory not found; UI will not be served");
    }

    let app = routes::app(app_state, static_dir, &config.cors_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Tonebridge API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
