use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::audio::autoplay;
use crate::audio::transport::UpdatePlayer;
use crate::bot::NovaBot;
use crate::events::{HandlerModule, SessionEvent};
use crate::ui::embeds;

pub fn module() -> HandlerModule {
    HandlerModule::session("queueEnd", |ctx, event| Box::pin(run(ctx, event)))
}

/// Cierre de cola: primero el autoplay intenta continuar; si no produce
/// nada, se desmonta la superficie de la sesión y se avisa el final.
async fn run(ctx: Arc<NovaBot>, event: SessionEvent) -> Result<()> {
    let SessionEvent::QueueEnd { session, last_track } = event else { return Ok(()) };

    if session.state.read().await.autoplay {
        autoplay::auto_play(&ctx, &session, last_track.as_ref()).await?;

        let continuation = {
            let mut state = session.state.write().await;
            state.queue.pop_next().map(|track| UpdatePlayer {
                track: Some(track),
                position: 0,
                volume: state.volume,
                paused: false,
            })
        };

        // si el motor encoló algo, la cola no terminó realmente
        if let Some(update) = continuation {
            session.worker().play(session.guild_id(), update).await?;
            return Ok(());
        }
    }

    let Some(text_channel) = session.text_channel_id else { return Ok(()) };

    let (message_id, lyrics_id, lyrics_enabled) = {
        let state = session.state.read().await;
        (state.message_id, state.lyrics_id, state.lyrics_enabled)
    };

    if let Some(lyrics_id) = lyrics_id {
        ctx.gateway.delete_message(text_channel, lyrics_id).await.ok();

        // solo hay algo que cortar si la cola terminó con el streaming activo
        if lyrics_enabled {
            session.worker().unsubscribe_lyrics(session.guild_id()).await.ok();
        }
    }

    if let Some(message_id) = message_id {
        if ctx.config.deleter.on_track_end {
            ctx.gateway.delete_message(text_channel, message_id).await.ok();
        } else {
            ctx.gateway.clear_components(text_channel, message_id).await.ok();
        }
    }

    if let Some(voice_channel) = session.voice_channel_id {
        ctx.gateway.set_voice_status(voice_channel, Some("📭 La cola terminó".into())).await.ok();
    }

    ctx.gateway.send(text_channel, embeds::queue_end(), Vec::new()).await.ok();

    let mut state = session.state.write().await;
    state.message_id = None;
    state.lyrics_id = None;
    state.lyrics = None;
    state.lyrics_enabled = false;

    debug!("📭 Cola terminada en el guild {}", session.guild_id());
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serenity::model::id::{ChannelId, GuildId, MessageId};

    use super::*;
    use crate::audio::session::Lyrics;
    use crate::gateway::MockGateway;
    use crate::testing::{test_bot, test_bot_with_gateway, track};

    #[tokio::test]
    async fn clears_recorded_ids_even_when_every_network_call_fails() {
        let mut gateway = MockGateway::new();
        gateway.expect_delete_message().returning(|_, _| Err(anyhow::anyhow!("boom")));
        gateway.expect_clear_components().returning(|_, _| Err(anyhow::anyhow!("boom")));
        gateway.expect_set_voice_status().returning(|_, _| Err(anyhow::anyhow!("boom")));
        gateway.expect_send().returning(|_, _, _| Err(anyhow::anyhow!("boom")));

        let (bot, _, transport) = test_bot_with_gateway(Arc::new(gateway)).await;
        let session = bot.sessions.create(
            GuildId::new(1),
            bot.workers.all()[0].clone(),
            Some(ChannelId::new(10)),
            Some(ChannelId::new(20)),
        );

        {
            let mut state = session.state.write().await;
            state.message_id = Some(MessageId::new(1));
            state.lyrics_id = Some(MessageId::new(2));
            state.lyrics = Some(Lyrics::default());
            state.lyrics_enabled = true;
        }

        bot.emit_session(SessionEvent::QueueEnd { session: session.clone(), last_track: None }).await;

        let state = session.state.read().await;
        assert_eq!(state.message_id, None);
        assert_eq!(state.lyrics_id, None);
        assert_eq!(state.lyrics, None);
        assert!(!state.lyrics_enabled);
        // el streaming activo se cortó en el worker
        assert_eq!(transport.unsubscribed.lock().as_slice(), [GuildId::new(1)]);
    }

    #[tokio::test]
    async fn autoplay_continuation_keeps_the_session_playing() {
        let (bot, _, transport) = test_bot().await;
        let session = bot.sessions.create(
            GuildId::new(1),
            bot.workers.all()[0].clone(),
            Some(ChannelId::new(10)),
            None,
        );

        let finished = track("seed", "spotify");
        {
            let mut state = session.state.write().await;
            state.autoplay = true;
            state.volume = 70;
            state.queue.current = Some(finished.clone());
        }
        *transport.search_results.lock() = vec![track("continuation", "spotify")];

        bot.emit_session(SessionEvent::QueueEnd {
            session: session.clone(),
            last_track: Some(finished),
        })
        .await;

        let plays = transport.plays.lock();
        assert_eq!(plays.len(), 1);
        let (_, update) = &plays[0];
        assert_eq!(update.track.as_ref().unwrap().info.identifier, "continuation");
        assert_eq!(update.volume, 70);
        assert!(!update.paused);
        drop(plays);

        // la superficie sigue en pie: la cola no terminó realmente
        let state = session.state.read().await;
        assert_eq!(state.queue.current.as_ref().unwrap().info.identifier, "continuation");
    }

    #[tokio::test]
    async fn without_autoplay_the_ended_notice_is_posted() {
        let mut gateway = MockGateway::new();
        gateway.expect_set_voice_status().times(1).returning(|_, _| Ok(()));
        gateway.expect_send().times(1).returning(|_, _, _| Ok(MessageId::new(50)));

        let (bot, _, transport) = test_bot_with_gateway(Arc::new(gateway)).await;
        let session = bot.sessions.create(
            GuildId::new(1),
            bot.workers.all()[0].clone(),
            Some(ChannelId::new(10)),
            Some(ChannelId::new(20)),
        );

        bot.emit_session(SessionEvent::QueueEnd { session, last_track: None }).await;

        assert!(transport.plays.lock().is_empty());
    }
}
