//! Momentum server binary

use std::sync::Arc;

use anyhow::Context;
use momentum::config::Config;
use momentum::database::DatabaseManager;
use momentum::logging::{init_logging, log_startup};
use momentum::server::{serve, AppState};
use momentum::services::{AnthropicProvider, SystemTimeProvider, TextCompletionProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;
    init_logging(&config.log_level, config.is_production());
    log_startup();
    config.log_config();

    config.ensure_data_dir()?;
    let db = DatabaseManager::new(&config.resolved_database_url()).await?;
    db.migrate().await?;

    let ai_provider = AnthropicProvider::from_config(&config)
        .context("Failed to set up AI provider")?
        .map(|provider| Arc::new(provider) as Arc<dyn TextCompletionProvider>);

    let state = AppState::new(config, db, Arc::new(SystemTimeProvider), ai_provider);
    serve(state).await
}
