use std::sync::Arc;

use anyhow::Result;
use tracing::error;

use crate::audio::session::SessionManager;
use crate::audio::transport::RestTransport;
use crate::audio::worker::{Worker, WorkerRegistry, WorkerState};
use crate::config::Config;
use crate::events::{Emitter, EventRegistry, ModuleEntry, SessionEvent, WorkerEvent};
use crate::gateway::Gateway;
use crate::storage::QueueStore;

/// Contexto compartido del bot.
///
/// Es el primer argumento de todo handler de eventos; agrupa la
/// configuración, el almacén durable, las sesiones en memoria, los workers
/// y los dos emisores upstream.
pub struct NovaBot {
    pub config: Config,
    pub store: QueueStore,
    pub sessions: SessionManager,
    pub workers: WorkerRegistry,
    pub gateway: Arc<dyn Gateway>,
    pub worker_events: Arc<Emitter<WorkerEvent>>,
    pub session_events: Arc<Emitter<SessionEvent>>,
    pub registry: EventRegistry,
}

impl NovaBot {
    pub fn new(config: Config, store: QueueStore, gateway: Arc<dyn Gateway>) -> Arc<Self> {
        let worker_events = Arc::new(Emitter::new("worker"));
        let session_events = Arc::new(Emitter::new("session"));
        let registry = EventRegistry::new(worker_events.clone(), session_events.clone());
        let sessions = SessionManager::new(config.default_volume);

        Arc::new(Self {
            config,
            store,
            sessions,
            workers: WorkerRegistry::new(),
            gateway,
            worker_events,
            session_events,
            registry,
        })
    }

    /// Crea los workers definidos en la configuración.
    pub fn init_workers(&self) -> Result<()> {
        for worker_config in &self.config.workers {
            let transport = Arc::new(RestTransport::new(&worker_config.address(), &worker_config.password)?);
            self.workers.insert(Arc::new(Worker::new(
                worker_config.id.as_str(),
                worker_config.address(),
                transport,
            )));
        }

        Ok(())
    }

    /// Carga el manifiesto de módulos handler en el registro.
    pub fn load_events(&self, entries: &[ModuleEntry]) {
        self.registry.load(entries);
    }

    /// Conecta todos los workers y emite `connected` por cada uno que responda.
    pub async fn connect_workers(self: &Arc<Self>) {
        for worker in self.workers.all() {
            match worker.connect().await {
                Ok(()) => self.emit_worker(WorkerEvent::Connected { worker }).await,
                Err(err) => {
                    worker.set_state(WorkerState::Failed);
                    error!("❌ No se pudo conectar el worker `{}`: {err:?}", worker.id());
                }
            }
        }
    }

    /// Despacha un evento de worker a los handlers suscritos.
    pub async fn emit_worker(self: &Arc<Self>, event: WorkerEvent) {
        self.worker_events.emit(self.clone(), event).await;
    }

    /// Despacha un evento de sesión a los handlers suscritos.
    pub async fn emit_session(self: &Arc<Self>, event: SessionEvent) {
        self.session_events.emit(self.clone(), event).await;
    }
}
