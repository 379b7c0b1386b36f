use std::sync::Arc;

use anyhow::Result;
use tracing::info;

mod audio;
mod bot;
mod config;
mod events;
mod gateway;
mod storage;
#[cfg(test)]
mod testing;
mod ui;

use crate::bot::NovaBot;
use crate::config::Config;
use crate::gateway::DiscordGateway;
use crate::storage::{JsonFileBackend, QueueStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nova_music=debug".parse()?)
                .add_directive("serenity=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando Nova Music v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let config = Config::load()?;
    info!("{}", config.summary());

    // Inicializar el almacén durable de colas
    let backend = Arc::new(JsonFileBackend::new(config.data_dir.join("queues")).await?);
    let store = QueueStore::new(backend, config.store_prefix.clone());

    // Gateway de Discord
    let gateway = Arc::new(DiscordGateway::new(&config.discord_token));

    // Armar el bot y sus workers
    let bot = NovaBot::new(config, store, gateway);
    bot.init_workers()?;
    bot.load_events(&events::modules());
    bot.connect_workers().await;

    info!("🚀 Bot iniciado exitosamente");

    // Shutdown graceful
    tokio::signal::ctrl_c().await?;
    info!("⚠️ Señal de shutdown recibida, cerrando...");

    Ok(())
}
