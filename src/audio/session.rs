use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serenity::model::id::{ChannelId, GuildId, MessageId};
use tokio::sync::RwLock;
use tracing::info;

use crate::storage::QueueStore;
use super::queue::{Queue, QueueFlags, RepeatMode, StoredQueue};
use super::worker::Worker;

/// Resultado de letras entregado por el worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Lyrics {
    pub provider: String,
    pub lines: Vec<LyricsLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LyricsLine {
    pub line: String,
    pub timestamp: Option<u64>,
}

/// Estado mutable de una sesión. Se mantiene tras un lock async porque los
/// handlers lo retienen a través de awaits.
///
/// Los campos que en otra vida fueron una side-table de atributos sueltos
/// son aquí campos explícitos, cada uno con un dueño claro.
#[derive(Debug, Default)]
pub struct SessionState {
    pub queue: Queue,
    /// Posición de reproducción conocida, en milisegundos.
    pub position: u64,
    pub volume: u16,
    pub paused: bool,
    pub repeat: RepeatMode,
    /// Dueño: motor de autoplay.
    pub autoplay: bool,
    /// Pista de idioma para el render de mensajes; la fija la capa de comandos.
    #[allow(dead_code)]
    pub locale: Option<String>,
    /// Superficie "now playing". Dueños: trackStart la escribe; trackEnd,
    /// queueEnd y playerDestroy la dejan en blanco.
    pub message_id: Option<MessageId>,
    /// Mensaje de letras; mismo régimen que `message_id`.
    pub lyrics_id: Option<MessageId>,
    pub lyrics: Option<Lyrics>,
    pub lyrics_enabled: bool,
}

impl SessionState {
    /// Proyección durable del estado: lo único que viaja al almacén.
    pub fn projection(&self) -> StoredQueue {
        StoredQueue {
            tracks: self.queue.tracks.iter().cloned().collect(),
            previous: self.queue.previous.clone(),
            current: self.queue.current.clone(),
            flags: QueueFlags { autoplay: self.autoplay, repeat: self.repeat },
        }
    }

    /// Sobrescribe el estado local con una proyección no vacía.
    pub fn apply(&mut self, stored: StoredQueue) {
        if stored.is_empty() {
            return;
        }

        self.queue.tracks = stored.tracks.into();
        self.queue.previous = stored.previous;
        self.queue.current = stored.current;
        self.autoplay = stored.flags.autoplay;
        self.repeat = stored.flags.repeat;
    }
}

/// Contexto de reproducción de un guild.
pub struct Session {
    guild_id: GuildId,
    worker: Arc<Worker>,
    pub text_channel_id: Option<ChannelId>,
    pub voice_channel_id: Option<ChannelId>,
    created_at: DateTime<Utc>,
    pub state: RwLock<SessionState>,
}

impl Session {
    fn new(
        guild_id: GuildId,
        worker: Arc<Worker>,
        text_channel_id: Option<ChannelId>,
        voice_channel_id: Option<ChannelId>,
        volume: u16,
    ) -> Self {
        Self {
            guild_id,
            worker,
            text_channel_id,
            voice_channel_id,
            created_at: Utc::now(),
            state: RwLock::new(SessionState { volume, ..Default::default() }),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn worker(&self) -> &Arc<Worker> {
        &self.worker
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Persiste la proyección actual de la cola.
    pub async fn save_queue(&self, store: &QueueStore) -> Result<()> {
        let projection = self.state.read().await.projection();
        store.set(self.guild_id, projection).await
    }

    /// Reconcilia la cola con el almacén durable, sobrescribiendo en ambos
    /// sentidos: lo persistido manda sobre la memoria y el resultado se
    /// vuelve a escribir, de modo que las dos copias convergen.
    pub async fn sync_queue(&self, store: &QueueStore) -> Result<()> {
        let stored = store.fetch(self.guild_id).await?;

        let projection = {
            let mut state = self.state.write().await;
            state.apply(stored);
            state.projection()
        };

        store.set(self.guild_id, projection).await
    }
}

/// Dueño exclusivo de las sesiones en memoria.
pub struct SessionManager {
    sessions: DashMap<GuildId, Arc<Session>>,
    default_volume: u16,
}

impl SessionManager {
    pub fn new(default_volume: u16) -> Self {
        Self { sessions: DashMap::new(), default_volume }
    }

    /// Crea la sesión de un guild, o devuelve la existente.
    pub fn create(
        &self,
        guild_id: GuildId,
        worker: Arc<Worker>,
        text_channel_id: Option<ChannelId>,
        voice_channel_id: Option<ChannelId>,
    ) -> Arc<Session> {
        self.sessions
            .entry(guild_id)
            .or_insert_with(|| {
                worker.bind(guild_id);
                info!("🎧 Sesión creada para el guild {guild_id}");
                Arc::new(Session::new(
                    guild_id,
                    worker.clone(),
                    text_channel_id,
                    voice_channel_id,
                    self.default_volume,
                ))
            })
            .clone()
    }

    pub fn get(&self, guild_id: GuildId) -> Option<Arc<Session>> {
        self.sessions.get(&guild_id).map(|s| s.value().clone())
    }

    /// Saca la sesión del manager y la desvincula de su worker.
    pub fn remove(&self, guild_id: GuildId) -> Option<Arc<Session>> {
        let (_, session) = self.sessions.remove(&guild_id)?;
        session.worker().unbind(guild_id);
        Some(session)
    }

    /// Sesiones vinculadas a un worker, en orden determinista de guild.
    pub fn for_worker(&self, worker_id: &str) -> Vec<Arc<Session>> {
        let mut sessions: Vec<Arc<Session>> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().worker().id() == worker_id)
            .map(|entry| entry.value().clone())
            .collect();

        sessions.sort_by_key(|s| s.guild_id());
        sessions
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}
