//! # Teacher Marks Bot Main Entry Point
//!
//! Initializes logging, loads configuration, prepares the database, and runs
//! the Telegram bot next to the health check server.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::dispatching::dialogue::InMemStorage;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use teacher_marks_bot::bot::handlers::BotHandler;
use teacher_marks_bot::config::Config;
use teacher_marks_bot::database::connection::DatabaseManager;
use teacher_marks_bot::database::store::RecordStore;
use teacher_marks_bot::dialogue::{DialogueController, MarksState};
use teacher_marks_bot::services::health::HealthService;
use teacher_marks_bot::services::report::ReportService;
use teacher_marks_bot::utils::logging::log_system_event;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teacher_marks_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Teacher Marks Bot v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded - Database: {}, Report: {}, HTTP Port: {}",
        config.database_url, config.report_path.display(), config.http_port);

    // Initialize database
    info!("Initializing database connection...");
    let db_manager = DatabaseManager::new(&config.database_url).await?;
    info!("Running database migrations...");
    db_manager.run_migrations().await?;
    let store = RecordStore::new(db_manager);
    info!("Database initialized successfully");

    // Initialize bot
    info!("Initializing Telegram bot...");
    let bot = Bot::new(&config.bot_token);
    let storage: Arc<InMemStorage<MarksState>> = InMemStorage::new().into();
    let dialogue = DialogueController::new(storage, store.clone());
    let reports = ReportService::new(store.clone(), config.report_path.clone());
    let handler = BotHandler::new(dialogue, reports);
    info!("Telegram bot initialized successfully");

    let health_service = HealthService::new(store);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

    info!("Health check server starting on port {}", config.http_port);

    // Run both the bot and health server concurrently
    let bot_task = tokio::spawn(async move {
        Dispatcher::builder(bot, handler.schema())
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_service.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    // Wait for either task to complete (which would indicate shutdown)
    tokio::select! {
        result1 = bot_task => {
            if let Err(e) = result1 {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result2 = health_task => {
            if let Err(e) = result2 {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    log_system_event("Application stopped", None);
    Ok(())
}
