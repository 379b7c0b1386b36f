use std::sync::Arc;

use anyhow::Result;
use rand::Rng;
use tracing::debug;

use crate::bot::NovaBot;
use super::session::Session;
use super::track::{sources, Track};

/// Descarta candidatos ya reproducidos o iguales al track recién terminado.
fn filter_candidates(previous: &[Track], last: &Track, candidates: Vec<Track>) -> Vec<Track> {
    candidates
        .into_iter()
        .filter(|track| !track.is_same(last) && !previous.iter().any(|p| p.is_same(track)))
        .collect()
}

/// Genera la continuación de autoplay cuando la cola se queda sin tracks.
///
/// Registra el track terminado en el historial, lo persiste y, según la
/// fuente, encola uno o varios candidatos relacionados. Una búsqueda sin
/// resultados no es un error: el autoplay simplemente deja de producir.
pub async fn auto_play(ctx: &Arc<NovaBot>, session: &Arc<Session>, last_track: Option<&Track>) -> Result<()> {
    let Some(last) = last_track else { return Ok(()) };

    let mut state = session.state.write().await;
    if !state.autoplay {
        return Ok(());
    }

    if state.queue.remember(last) {
        ctx.store.set(session.guild_id(), state.projection()).await?;
    }

    match last.info.source_name.as_str() {
        sources::SPOTIFY => {
            // la semilla es el item de spotify más antiguo del historial
            let Some(seed) = state
                .queue
                .previous
                .iter()
                .rev()
                .find(|track| track.info.source_name == sources::SPOTIFY)
                .cloned()
            else {
                return Ok(());
            };

            let query = format!("sprec:mix:track:{}", seed.info.identifier);
            let found = session.worker().load_tracks(&query).await?;

            let candidates = filter_candidates(&state.queue.previous, last, found);
            if candidates.is_empty() {
                debug!("🤖 Autoplay sin candidatos para {}", session.guild_id());
                return Ok(());
            }

            let pick = candidates[rand::thread_rng().gen_range(0..candidates.len())].clone();
            state.queue.enqueue(pick);
            ctx.store.set(session.guild_id(), state.projection()).await?;
        }
        sources::YOUTUBE | sources::YOUTUBE_MUSIC => {
            let query = format!(
                "https://www.youtube.com/watch?v={id}&list=RD{id}",
                id = last.info.identifier
            );
            let found = session.worker().load_tracks(&query).await?;

            let candidates = filter_candidates(&state.queue.previous, last, found);
            if candidates.is_empty() {
                debug!("🤖 Autoplay sin candidatos para {}", session.guild_id());
                return Ok(());
            }

            // rebanada contigua con offset aleatorio, hasta el límite configurado
            let offset = rand::thread_rng().gen_range(0..candidates.len());
            let end = (offset + ctx.config.autoplay_limit).min(candidates.len());
            state
                .queue
                .enqueue_capped(candidates[offset..end].iter().cloned(), ctx.config.max_queue_size);
            ctx.store.set(session.guild_id(), state.projection()).await?;
        }
        _ => {}
    }

    Ok(())
}
