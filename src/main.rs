use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use daigou_api::config::AppConfig;
use daigou_api::events::{self, EventSender};
use daigou_api::{app_router, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let db_pool = Arc::new(
        db::establish_connection(&config.database_url)
            .await
            .context("failed to connect to the database")?,
    );
    db::run_migrations(&db_pool)
        .await
        .context("failed to create the schema")?;

    let (tx, rx) = tokio::sync::mpsc::channel(1024);
    let event_sender = Arc::new(EventSender::new(tx));
    tokio::spawn(events::process_events(rx));

    let state = AppState::new(db_pool, config.clone(), Some(event_sender))?;
    let app = app_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "daigou-api listening");
    axum::serve(listener, app).await?;

    Ok(())
}
