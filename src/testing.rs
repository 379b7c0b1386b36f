//! Dobles de prueba compartidos: backend de almacén en memoria, transporte
//! de worker que graba lo que recibe y un gateway que no hace nada.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use serenity::builder::{CreateActionRow, CreateEmbed};
use serenity::model::id::{ChannelId, GuildId, MessageId};

use crate::audio::track::{Track, TrackInfo};
use crate::audio::transport::{
    TransportError, TransportResult, UpdatePlayer, UpdateSession, WorkerInfo, WorkerTransport,
};
use crate::audio::worker::Worker;
use crate::bot::NovaBot;
use crate::config::Config;
use crate::events;
use crate::gateway::Gateway;
use crate::storage::{QueueStore, StoreBackend};

/// Construye un track mínimo con identidad reconocible.
pub fn track(identifier: &str, source: &str) -> Track {
    Track {
        encoded: Some(format!("encoded-{identifier}")),
        info: TrackInfo {
            identifier: identifier.to_string(),
            title: format!("title-{identifier}"),
            author: format!("author-{identifier}"),
            uri: Some(format!("https://example.com/{identifier}")),
            artwork_url: None,
            duration: 180_000,
            is_stream: false,
            source_name: source.to_string(),
        },
        requester: None,
    }
}

/// Backend clave/valor en memoria.
#[derive(Default)]
pub struct MemoryBackend {
    data: DashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.get(key).map(|v| v.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }
}

/// Transporte de worker que graba cada instrucción recibida.
#[derive(Default)]
pub struct RecordingTransport {
    pub plays: Mutex<Vec<(GuildId, UpdatePlayer)>>,
    pub session_updates: Mutex<Vec<UpdateSession>>,
    pub searches: Mutex<Vec<String>>,
    pub unsubscribed: Mutex<Vec<GuildId>>,
    /// Resultados enlatados que devuelve `load_tracks`.
    pub search_results: Mutex<Vec<Track>>,
    /// Guilds cuyos `update_player` fallan con un error inyectado.
    pub fail_guilds: DashSet<GuildId>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkerTransport for RecordingTransport {
    async fn info(&self) -> TransportResult<WorkerInfo> {
        Ok(WorkerInfo { version: "test".to_string() })
    }

    async fn update_player(&self, guild_id: GuildId, update: &UpdatePlayer) -> TransportResult<()> {
        if self.fail_guilds.contains(&guild_id) {
            return Err(TransportError::Status { status: 500, body: "inyectado".to_string() });
        }

        self.plays.lock().push((guild_id, update.clone()));
        Ok(())
    }

    async fn update_session(&self, update: &UpdateSession) -> TransportResult<()> {
        self.session_updates.lock().push(*update);
        Ok(())
    }

    async fn load_tracks(&self, identifier: &str) -> TransportResult<Vec<Track>> {
        self.searches.lock().push(identifier.to_string());
        Ok(self.search_results.lock().clone())
    }

    async fn unsubscribe_lyrics(&self, guild_id: GuildId) -> TransportResult<()> {
        self.unsubscribed.lock().push(guild_id);
        Ok(())
    }
}

/// Gateway que acepta todo sin tocar la red.
pub struct NoopGateway;

#[async_trait]
impl Gateway for NoopGateway {
    async fn send(
        &self,
        _channel: ChannelId,
        _embed: CreateEmbed,
        _components: Vec<CreateActionRow>,
    ) -> Result<MessageId> {
        Ok(MessageId::new(1))
    }

    async fn edit_embed(&self, _channel: ChannelId, _message: MessageId, _embed: CreateEmbed) -> Result<()> {
        Ok(())
    }

    async fn clear_components(&self, _channel: ChannelId, _message: MessageId) -> Result<()> {
        Ok(())
    }

    async fn delete_message(&self, _channel: ChannelId, _message: MessageId) -> Result<()> {
        Ok(())
    }

    async fn set_voice_status(&self, _channel: ChannelId, _status: Option<String>) -> Result<()> {
        Ok(())
    }
}

/// Bot completo con dobles: manifiesto cargado y un worker `main` grabador.
pub async fn test_bot() -> (Arc<NovaBot>, Arc<MemoryBackend>, Arc<RecordingTransport>) {
    test_bot_custom(Arc::new(NoopGateway), |_| {}).await
}

/// Igual que [`test_bot`], con un gateway propio (usualmente un mock).
pub async fn test_bot_with_gateway(
    gateway: Arc<dyn Gateway>,
) -> (Arc<NovaBot>, Arc<MemoryBackend>, Arc<RecordingTransport>) {
    test_bot_custom(gateway, |_| {}).await
}

/// Variante con gateway propio y un ajuste de configuración previo.
pub async fn test_bot_custom(
    gateway: Arc<dyn Gateway>,
    configure: impl FnOnce(&mut Config),
) -> (Arc<NovaBot>, Arc<MemoryBackend>, Arc<RecordingTransport>) {
    let mut config = Config::default();
    configure(&mut config);

    let backend = Arc::new(MemoryBackend::new());
    let store = QueueStore::new(backend.clone(), config.store_prefix.clone());

    let bot = NovaBot::new(config, store, gateway);

    let transport = Arc::new(RecordingTransport::new());
    bot.workers.insert(Arc::new(Worker::new("main", "localhost:2333", transport.clone())));

    bot.load_events(&events::modules());

    (bot, backend, transport)
}
