//! techtask - Bot Entry Point
//!
//! Loads configuration, opens the task store, validates the bot token, and
//! starts the long-polling loop.

use std::sync::Arc;
use techtask::bot::Bot;
use techtask::config::Config;
use techtask::store::SqliteTaskStore;
use techtask::telegram::TelegramClient;
use techtask::workflow::WorkflowHandler;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "techtask=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: tech_chat_id={}, db_path={}",
        config.tech_chat_id,
        config.db_path.display()
    );

    let store = SqliteTaskStore::new(&config.db_path).await?;
    let client = Arc::new(TelegramClient::new(
        config.bot_token.clone(),
        config.api_base_url.clone(),
    ));

    // A bad token should not enter the poll loop.
    let username = client.get_me().await?;
    info!("Authorized as @{}", username);

    let handler = WorkflowHandler::new(Arc::new(store), client.clone(), config.tech_chat_id);

    info!("Bot is running and ready to accept tasks");
    Bot::new(client, handler).run().await;

    Ok(())
}
