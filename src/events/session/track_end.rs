use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::bot::NovaBot;
use crate::events::{HandlerModule, SessionEvent};

pub fn module() -> HandlerModule {
    HandlerModule::session("trackEnd", |ctx, event| Box::pin(run(ctx, event)))
}

/// Limpieza por transición de track: descarta la superficie "now playing"
/// del track terminado sin tocar el estado de autoplay.
async fn run(ctx: Arc<NovaBot>, event: SessionEvent) -> Result<()> {
    let SessionEvent::TrackEnd { session, track } = event else { return Ok(()) };
    let Some(text_channel) = session.text_channel_id else { return Ok(()) };

    let (message_id, lyrics_id) = {
        let state = session.state.read().await;
        (state.message_id, state.lyrics_id)
    };

    if let Some(message_id) = message_id {
        if ctx.config.deleter.on_track_end {
            ctx.gateway.delete_message(text_channel, message_id).await.ok();
        } else {
            ctx.gateway.clear_components(text_channel, message_id).await.ok();
        }
    }

    if let Some(lyrics_id) = lyrics_id {
        ctx.gateway.delete_message(text_channel, lyrics_id).await.ok();
    }

    let mut state = session.state.write().await;
    state.message_id = None;
    state.lyrics_id = None;
    state.lyrics = None;

    debug!(
        "⏹️ Track terminado en {}: {}",
        session.guild_id(),
        track.map(|t| t.info.title).unwrap_or_else(|| "desconocido".into())
    );
    Ok(())
}
