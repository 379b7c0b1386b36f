use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::audio::session::Session;
use crate::audio::transport::UpdatePlayer;
use crate::audio::worker::WorkerState;
use crate::bot::NovaBot;
use crate::events::{HandlerModule, WorkerEvent};

pub fn module() -> HandlerModule {
    HandlerModule::worker("connected", |ctx, event| Box::pin(run(ctx, event)))
}

/// Reanuda las sesiones de un worker que acaba de (re)conectarse.
///
/// El replay es secuencial a propósito: un worker recién recuperado no
/// tiene por qué recibir todas las sesiones a la vez.
async fn run(ctx: Arc<NovaBot>, event: WorkerEvent) -> Result<()> {
    let WorkerEvent::Connected { worker } = event else { return Ok(()) };

    let sessions = ctx.sessions.for_worker(worker.id());
    if ctx.config.sessions.resume_players && !sessions.is_empty() && !worker.resuming().enabled {
        worker.set_state(WorkerState::Resuming);

        for session in &sessions {
            if let Err(err) = resume(&ctx, session).await {
                // una sesión rota no deja tiradas a las demás
                error!("🎧 Error al reanudar la sesión {}: {err:?}", session.guild_id());
            }
        }

        worker.set_state(WorkerState::Connected);
    }

    if ctx.config.sessions.enabled {
        worker
            .update_session(true, ctx.config.sessions.resume_time_ms)
            .await
            .context("No se pudo armar la persistencia de sesión")?;
    }

    info!("🎶 Worker `{}` conectado", worker.id());
    Ok(())
}

async fn resume(ctx: &Arc<NovaBot>, session: &Arc<Session>) -> Result<()> {
    session.sync_queue(&ctx.store).await?;

    let update = {
        let state = session.state.read().await;
        UpdatePlayer {
            track: state.queue.current.clone(),
            position: state.position,
            volume: state.volume,
            paused: state.paused,
        }
    };

    session.worker().play(session.guild_id(), update).await
}
