use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use serenity::model::id::GuildId;
use tracing::{debug, info};

use super::track::Track;
use super::transport::{UpdatePlayer, UpdateSession, WorkerStats, WorkerTransport};

/// Estados de salud de la conexión con un worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Disconnected,
    Connecting,
    Connected,
    Resuming,
    Failed,
}

/// Estado de la persistencia de sesión reportada/armada en el worker.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResumeStatus {
    pub enabled: bool,
    pub timeout_ms: u64,
}

/// Conexión con un worker de audio remoto.
///
/// Se crea al arranque desde la configuración estática y vive hasta el
/// shutdown del proceso; las transiciones de estado las manejan los
/// handlers de eventos de worker.
pub struct Worker {
    id: String,
    address: String,
    transport: Arc<dyn WorkerTransport>,
    state: RwLock<WorkerState>,
    resuming: RwLock<ResumeStatus>,
    stats: RwLock<Option<WorkerStats>>,
    bound: DashSet<GuildId>,
}

impl Worker {
    pub fn new(id: impl Into<String>, address: impl Into<String>, transport: Arc<dyn WorkerTransport>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            transport,
            state: RwLock::new(WorkerState::Disconnected),
            resuming: RwLock::new(ResumeStatus::default()),
            stats: RwLock::new(None),
            bound: DashSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    #[allow(dead_code)]
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn state(&self) -> WorkerState {
        *self.state.read()
    }

    pub fn set_state(&self, next: WorkerState) {
        let mut state = self.state.write();
        if *state != next {
            debug!("🔀 Worker `{}`: {:?} -> {:?}", self.id, *state, next);
            *state = next;
        }
    }

    pub fn resuming(&self) -> ResumeStatus {
        *self.resuming.read()
    }

    #[cfg(test)]
    pub fn set_resuming(&self, status: ResumeStatus) {
        *self.resuming.write() = status;
    }

    pub fn stats(&self) -> Option<WorkerStats> {
        *self.stats.read()
    }

    pub fn set_stats(&self, stats: WorkerStats) {
        *self.stats.write() = Some(stats);
    }

    /// Vincula una sesión a este worker.
    pub fn bind(&self, guild_id: GuildId) {
        self.bound.insert(guild_id);
    }

    /// Desvincula una sesión de este worker.
    pub fn unbind(&self, guild_id: GuildId) {
        self.bound.remove(&guild_id);
    }

    pub fn bound_sessions(&self) -> Vec<GuildId> {
        let mut sessions: Vec<GuildId> = self.bound.iter().map(|g| *g).collect();
        sessions.sort_unstable();
        sessions
    }

    /// Handshake con el worker; deja el estado en `Connected`.
    pub async fn connect(&self) -> Result<()> {
        self.set_state(WorkerState::Connecting);

        let info = self
            .transport
            .info()
            .await
            .with_context(|| format!("El worker `{}` no respondió al handshake", self.id))?;
        self.set_state(WorkerState::Connected);

        info!("🔌 Worker `{}` listo en {} (v{})", self.id, self.address, info.version);
        Ok(())
    }

    /// Envía una instrucción de reproducción/replay para un guild.
    pub async fn play(&self, guild_id: GuildId, update: UpdatePlayer) -> Result<()> {
        self.transport
            .update_player(guild_id, &update)
            .await
            .with_context(|| format!("No se pudo reproducir en el guild {guild_id}"))
    }

    /// Arma la persistencia de sesión del worker con la ventana dada.
    pub async fn update_session(&self, enabled: bool, timeout_ms: u64) -> Result<()> {
        self.transport
            .update_session(&UpdateSession { resuming: enabled, timeout: timeout_ms })
            .await
            .with_context(|| format!("No se pudo armar la persistencia del worker `{}`", self.id))?;

        *self.resuming.write() = ResumeStatus { enabled, timeout_ms };
        Ok(())
    }

    /// Resuelve tracks a través de este worker.
    pub async fn load_tracks(&self, identifier: &str) -> Result<Vec<Track>> {
        self.transport
            .load_tracks(identifier)
            .await
            .with_context(|| format!("La búsqueda `{identifier}` falló en el worker `{}`", self.id))
    }

    /// Corta el streaming de letras de un guild.
    pub async fn unsubscribe_lyrics(&self, guild_id: GuildId) -> Result<()> {
        self.transport
            .unsubscribe_lyrics(guild_id)
            .await
            .with_context(|| format!("No se pudo cortar las letras del guild {guild_id}"))
    }
}

/// Registro de los workers configurados al arranque.
#[derive(Default)]
pub struct WorkerRegistry {
    workers: DashMap<String, Arc<Worker>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, worker: Arc<Worker>) {
        self.workers.insert(worker.id().to_string(), worker);
    }

    #[allow(dead_code)]
    pub fn get(&self, id: &str) -> Option<Arc<Worker>> {
        self.workers.get(id).map(|w| w.value().clone())
    }

    pub fn all(&self) -> Vec<Arc<Worker>> {
        let mut workers: Vec<Arc<Worker>> = self.workers.iter().map(|w| w.value().clone()).collect();
        workers.sort_by(|a, b| a.id().cmp(b.id()));
        workers
    }
}
