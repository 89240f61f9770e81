use std::sync::Arc;

use clap::Parser;
use futures::StreamExt;

use crosspost::config::Config;
use crosspost::engine::{DeliveryConfig, SessionRegistry};
use crosspost::llm::OpenAiProvider;
use crosspost::store::MemoryStore;
use crosspost::transport::{TelegramTransport, Transport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("crosspost=info")),
        )
        .init();

    let config = Config::parse();
    let delivery = DeliveryConfig::from(&config);

    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(TelegramTransport::new(config.telegram_token.clone()));
    let llm = Arc::new(OpenAiProvider::new(
        config.openai_base_url.clone(),
        config.openai_model.clone(),
        config.openai_api_key.clone(),
    ));

    let registry = SessionRegistry::new(store, transport.clone(), llm, delivery);

    tracing::info!("Starting update stream");
    let mut updates = transport.start().await?;
    while let Some(update) = updates.next().await {
        registry.dispatch(update).await;
    }

    tracing::info!("Update stream closed, shutting down");
    Ok(())
}
