//! Filebridge entrypoint: load configuration, wire the adapters to the
//! conversation engine, and serve the Twilio webhook.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use filebridge::adapters::convert::StandardConverter;
use filebridge::adapters::fetch::TwilioMediaFetcher;
use filebridge::adapters::files::{BlobFileStore, WorkflowIngestion};
use filebridge::adapters::http::{webhook_router, WebhookState};
use filebridge::adapters::qa::{HuggingFaceAssistant, HuggingFaceQa};
use filebridge::adapters::session::InMemorySessionStore;
use filebridge::adapters::transport::TwilioTransport;
use filebridge::application::ConversationEngine;
use filebridge::config::AppConfig;
use filebridge::domain::conversation::MENUS;
use filebridge::ports::AssistantReplier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    // A broken menu definition should stop the process at startup, not
    // surface as a dead conversation later.
    MENUS.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.storage.max_connections)
        .connect(&config.storage.database_url)
        .await?;
    info!("connected to file index database");

    let sessions = Arc::new(InMemorySessionStore::new());
    let transport = Arc::new(TwilioTransport::new(config.twilio.transport_settings())?);
    let files = Arc::new(BlobFileStore::new(
        config.storage.gateway_settings(),
        pool,
    )?);
    let ingestion = Arc::new(WorkflowIngestion::new(
        config.storage.ingestion_webhook_url.clone(),
        Duration::from_secs(config.storage.gateway_timeout_secs),
    )?);
    let fetcher = Arc::new(TwilioMediaFetcher::new(
        config.twilio.account_sid.clone(),
        secrecy::Secret::new(config.twilio.auth_token.expose_secret().clone()),
        config.twilio.timeout(),
    )?);
    let converter = Arc::new(StandardConverter::new(config.convert.converter_settings()));

    let hf_settings = config
        .ai
        .hugging_face_settings(config.convert.pdftotext_bin.clone());
    let qa = Arc::new(HuggingFaceQa::new(hf_settings.clone()));

    std::fs::create_dir_all(&config.storage.staging_dir)?;

    let mut engine = ConversationEngine::new(
        sessions,
        transport,
        files,
        ingestion,
        fetcher,
        converter,
        qa,
        config.storage.staging_dir.clone(),
    );
    if config.ai.assistant_enabled {
        let assistant: Arc<dyn AssistantReplier> =
            Arc::new(HuggingFaceAssistant::new(hf_settings));
        engine = engine.with_assistant(assistant);
    }

    let state = WebhookState {
        sink: Arc::new(engine),
    };
    let app = webhook_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "filebridge listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
