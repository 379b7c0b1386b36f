//! # Events Module
//!
//! Event dispatch for the audio subsystem.
//!
//! The audio worker cluster produces two independent event streams with
//! different lifecycles:
//!
//! - *worker* events: connectivity and statistics of a backend connection
//! - *session* events: per-guild playback transitions (track start/end,
//!   queue end, destroy, lyric ticks)
//!
//! Each stream has its own [`Emitter`]; the [`EventRegistry`] is the single
//! subscription point for both. Handler logic lives in handler modules (one
//! file per event under `worker/` and `session/`) that can be swapped at
//! runtime through [`EventRegistry::reload`] without restarting the bot.
//!
//! Dispatch is sequential: an emitter awaits each callback before invoking
//! the next one, so events from one stream are processed in arrival order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use tracing::{error, info, warn};

use crate::audio::session::Session;
use crate::audio::track::Track;
use crate::audio::transport::WorkerStats;
use crate::audio::worker::Worker;
use crate::bot::NovaBot;

pub mod session;
pub mod worker;

/// Evento a nivel de worker.
#[derive(Clone)]
pub enum WorkerEvent {
    Connected { worker: Arc<Worker> },
    Disconnected { worker: Arc<Worker>, reason: Option<String> },
    Stats { worker: Arc<Worker>, stats: WorkerStats },
}

impl WorkerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Disconnected { .. } => "disconnected",
            Self::Stats { .. } => "stats",
        }
    }
}

/// Evento a nivel de sesión.
#[derive(Clone)]
pub enum SessionEvent {
    TrackStart { session: Arc<Session>, track: Track },
    TrackEnd { session: Arc<Session>, track: Option<Track> },
    QueueEnd { session: Arc<Session>, last_track: Option<Track> },
    PlayerDestroy { session: Arc<Session> },
    LyricsLine { session: Arc<Session>, line_index: usize },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TrackStart { .. } => "trackStart",
            Self::TrackEnd { .. } => "trackEnd",
            Self::QueueEnd { .. } => "queueEnd",
            Self::PlayerDestroy { .. } => "playerDestroy",
            Self::LyricsLine { .. } => "lyricsLine",
        }
    }
}

/// Nombre de alambre del evento que transporta un payload.
pub trait EventPayload: Clone + Send + Sync + 'static {
    fn event_name(&self) -> &'static str;
}

impl EventPayload for WorkerEvent {
    fn event_name(&self) -> &'static str {
        self.name()
    }
}

impl EventPayload for SessionEvent {
    fn event_name(&self) -> &'static str {
        self.name()
    }
}

pub type SubscriptionId = u64;
pub type Callback<E> = Arc<dyn Fn(Arc<NovaBot>, E) -> BoxFuture<'static, Result<()>> + Send + Sync>;

struct Listener<E> {
    id: SubscriptionId,
    once: bool,
    callback: Callback<E>,
}

/// Emisor de eventos con despacho secuencial en orden de suscripción.
pub struct Emitter<E> {
    label: &'static str,
    next_id: AtomicU64,
    listeners: RwLock<HashMap<String, Vec<Listener<E>>>>,
}

impl<E: EventPayload> Emitter<E> {
    pub fn new(label: &'static str) -> Self {
        Self { label, next_id: AtomicU64::new(1), listeners: RwLock::new(HashMap::new()) }
    }

    /// Suscribe un callback; con `once` se elimina antes de su primer disparo.
    pub fn subscribe(&self, event: &str, once: bool, callback: Callback<E>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .entry(event.to_string())
            .or_default()
            .push(Listener { id, once, callback });
        id
    }

    /// Quita una suscripción; devuelve si existía.
    pub fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(entries) = listeners.get_mut(event) else { return false };

        let before = entries.len();
        entries.retain(|listener| listener.id != id);
        before != entries.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map_or(0, Vec::len)
    }

    /// Despacha un evento a sus suscriptores, en orden y esperando cada uno.
    ///
    /// Un error dentro de un callback se registra aquí y no interrumpe el
    /// despacho del resto.
    pub async fn emit(&self, ctx: Arc<NovaBot>, payload: E) {
        let name = payload.event_name();

        let batch: Vec<Callback<E>> = {
            let mut listeners = self.listeners.write();
            let Some(entries) = listeners.get_mut(name) else { return };

            let batch = entries.iter().map(|l| l.callback.clone()).collect();
            entries.retain(|listener| !listener.once);
            batch
        };

        for callback in batch {
            if let Err(err) = callback(ctx.clone(), payload.clone()).await {
                error!("⚠️ Error en el handler de `{name}` ({}): {err:?}", self.label);
            }
        }
    }
}

/// Callback tipado según su fuente; la variante es el discriminante de
/// categoría y se decide una sola vez, al construir el módulo.
#[derive(Clone)]
pub enum HandlerRun {
    Worker(Callback<WorkerEvent>),
    Session(Callback<SessionEvent>),
}

/// Categoría de origen de un módulo handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Worker,
    Session,
}

/// Unidad enchufable que reacciona a un evento con nombre de una fuente.
#[derive(Clone)]
pub struct HandlerModule {
    pub name: String,
    pub once: bool,
    pub run: HandlerRun,
}

impl HandlerModule {
    pub fn worker<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(Arc<NovaBot>, WorkerEvent) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        Self { name: name.into(), once: false, run: HandlerRun::Worker(Arc::new(run)) }
    }

    pub fn session<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(Arc<NovaBot>, SessionEvent) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        Self { name: name.into(), once: false, run: HandlerRun::Session(Arc::new(run)) }
    }

    /// Marca el módulo como de un solo disparo.
    #[allow(dead_code)]
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn source(&self) -> EventSource {
        match self.run {
            HandlerRun::Worker(_) => EventSource::Worker,
            HandlerRun::Session(_) => EventSource::Session,
        }
    }
}

/// Fábrica de un módulo handler; el equivalente compilado de importar el
/// archivo del módulo, y lo que `reload` vuelve a invocar.
pub type ModuleFactory = fn() -> HandlerModule;

/// Entrada del manifiesto de módulos: fábrica más ruta de origen.
#[derive(Clone, Copy)]
pub struct ModuleEntry {
    pub origin: &'static str,
    pub factory: ModuleFactory,
}

/// Manifiesto de los módulos incluidos en el binario.
pub fn modules() -> Vec<ModuleEntry> {
    vec![
        ModuleEntry { origin: "events/worker/connected.rs", factory: worker::connected::module },
        ModuleEntry { origin: "events/worker/disconnected.rs", factory: worker::disconnected::module },
        ModuleEntry { origin: "events/worker/stats.rs", factory: worker::stats::module },
        ModuleEntry { origin: "events/session/track_start.rs", factory: session::track_start::module },
        ModuleEntry { origin: "events/session/track_end.rs", factory: session::track_end::module },
        ModuleEntry { origin: "events/session/queue_end.rs", factory: session::queue_end::module },
        ModuleEntry { origin: "events/session/player_destroy.rs", factory: session::player_destroy::module },
        ModuleEntry { origin: "events/session/lyrics_line.rs", factory: session::lyrics_line::module },
    ]
}

struct ActiveModule {
    module: HandlerModule,
    entry: ModuleEntry,
    subscription: SubscriptionId,
}

/// Registro de módulos handler y único punto de suscripción a ambos emisores.
pub struct EventRegistry {
    worker_events: Arc<Emitter<WorkerEvent>>,
    session_events: Arc<Emitter<SessionEvent>>,
    values: RwLock<HashMap<String, ActiveModule>>,
}

impl EventRegistry {
    pub fn new(
        worker_events: Arc<Emitter<WorkerEvent>>,
        session_events: Arc<Emitter<SessionEvent>>,
    ) -> Self {
        Self { worker_events, session_events, values: RwLock::new(HashMap::new()) }
    }

    /// Carga los módulos de un manifiesto. Un módulo inválido se descarta
    /// con una advertencia; nunca tumba la carga completa.
    pub fn load(&self, entries: &[ModuleEntry]) {
        let mut loaded = 0;

        for entry in entries {
            let module = (entry.factory)();
            if !self.validate(&module, entry.origin, None) {
                continue;
            }

            let subscription = self.subscribe(&module);
            self.values
                .write()
                .insert(module.name.clone(), ActiveModule { module, entry: *entry, subscription });
            loaded += 1;
        }

        info!("🧩 {loaded} módulos de eventos cargados");
    }

    /// Recarga un módulo por nombre. Con un nombre desconocido no hace nada.
    ///
    /// La entrada del registro se reemplaza solo después de validar y
    /// suscribir el módulo nuevo; un evento que llegue estrictamente entre
    /// la desuscripción vieja y la suscripción nueva se pierde. Es una
    /// limitación aceptada: la recarga es una acción de mantenimiento del
    /// operador, no un camino de régimen.
    pub fn reload(&self, name: &str) {
        let Some((entry, old_source, old_subscription)) = ({
            let values = self.values.read();
            values.get(name).map(|active| (active.entry, active.module.source(), active.subscription))
        }) else {
            return;
        };

        let module = (entry.factory)();
        if !self.validate(&module, entry.origin, Some(name)) {
            // el módulo viejo sigue suscrito: no se abre una ventana sin handler
            return;
        }

        // quitar la suscripción vieja del emisor que indique su variante;
        // nunca adivinar la fuente, siempre re-consultarla
        match old_source {
            EventSource::Worker => self.worker_events.unsubscribe(name, old_subscription),
            EventSource::Session => self.session_events.unsubscribe(name, old_subscription),
        };

        let subscription = self.subscribe(&module);

        let mut values = self.values.write();
        values.remove(name);
        values.insert(module.name.clone(), ActiveModule { module, entry, subscription });

        info!("🔄 Módulo `{name}` recargado");
    }

    /// Recarga todos los módulos conocidos, en secuencia.
    ///
    /// Sin lock interno: las recargas administrativas deben serializarse
    /// desde afuera.
    #[allow(dead_code)]
    pub fn reload_all(&self) {
        let names: Vec<String> = self.values.read().keys().cloned().collect();
        for name in names {
            self.reload(&name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.read().contains_key(name)
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    fn validate(&self, module: &HandlerModule, origin: &str, replacing: Option<&str>) -> bool {
        if module.name.is_empty() {
            warn!("⚠️ `{origin}` no define `name`; módulo omitido");
            return false;
        }

        let duplicate = replacing != Some(module.name.as_str()) && self.contains(&module.name);
        if duplicate {
            warn!("⚠️ `{origin}` repite el evento `{}`; módulo omitido", module.name);
            return false;
        }

        true
    }

    fn subscribe(&self, module: &HandlerModule) -> SubscriptionId {
        match &module.run {
            HandlerRun::Worker(callback) => {
                self.worker_events.subscribe(&module.name, module.once, callback.clone())
            }
            HandlerRun::Session(callback) => {
                self.session_events.subscribe(&module.name, module.once, callback.clone())
            }
        }
    }
}
