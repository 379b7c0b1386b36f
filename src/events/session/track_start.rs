use std::sync::Arc;

use anyhow::Result;

use crate::bot::NovaBot;
use crate::events::{HandlerModule, SessionEvent};
use crate::ui::{buttons, embeds};

pub fn module() -> HandlerModule {
    HandlerModule::session("trackStart", |ctx, event| Box::pin(run(ctx, event)))
}

/// Publica la superficie "now playing" y registra su id de mensaje.
async fn run(ctx: Arc<NovaBot>, event: SessionEvent) -> Result<()> {
    let SessionEvent::TrackStart { session, track } = event else { return Ok(()) };

    // lo que el worker reporta como sonando es la verdad sobre `current`
    let (autoplay, paused, repeat, volume, queue_len) = {
        let mut state = session.state.write().await;
        state.queue.current = Some(track.clone());
        (state.autoplay, state.paused, state.repeat, state.volume, state.queue.tracks.len())
    };
    session.save_queue(&ctx.store).await?;

    let Some(text_channel) = session.text_channel_id else { return Ok(()) };

    if let Some(voice_channel) = session.voice_channel_id {
        let status = format!("🎵 {}: {}", track.info.author, track.info.title);
        ctx.gateway.set_voice_status(voice_channel, Some(status)).await.ok();
    }

    let embed = embeds::now_playing(&track, volume, queue_len);
    let components = buttons::player_controls(paused, repeat, autoplay);

    // la superficie es mejor-esfuerzo: sin mensaje no hay transición a Posted
    if let Ok(message_id) = ctx.gateway.send(text_channel, embed, components).await {
        session.state.write().await.message_id = Some(message_id);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use serenity::model::id::{ChannelId, GuildId, MessageId};

    use super::*;
    use crate::gateway::MockGateway;
    use crate::testing::{test_bot_with_gateway, track};

    #[tokio::test]
    async fn posts_the_surface_and_records_the_message_id() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_set_voice_status()
            .with(eq(ChannelId::new(20)), eq(Some("🎵 author-a: title-a".to_string())))
            .times(1)
            .returning(|_, _| Ok(()));
        gateway.expect_send().times(1).returning(|_, _, _| Ok(MessageId::new(99)));

        let (bot, backend, _) = test_bot_with_gateway(Arc::new(gateway)).await;
        let session = bot.sessions.create(
            GuildId::new(1),
            bot.workers.all()[0].clone(),
            Some(ChannelId::new(10)),
            Some(ChannelId::new(20)),
        );

        bot.emit_session(SessionEvent::TrackStart { session: session.clone(), track: track("a", "youtube") })
            .await;

        let state = session.state.read().await;
        assert_eq!(state.message_id, Some(MessageId::new(99)));
        // `current` quedó reconciliado y persistido
        assert_eq!(state.queue.current.as_ref().unwrap().info.identifier, "a");
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn a_failed_post_leaves_the_surface_without_message() {
        let mut gateway = MockGateway::new();
        gateway.expect_send().times(1).returning(|_, _, _| Err(anyhow::anyhow!("boom")));

        let (bot, _, _) = test_bot_with_gateway(Arc::new(gateway)).await;
        let session = bot.sessions.create(
            GuildId::new(1),
            bot.workers.all()[0].clone(),
            Some(ChannelId::new(10)),
            None,
        );

        bot.emit_session(SessionEvent::TrackStart { session: session.clone(), track: track("a", "youtube") })
            .await;

        assert_eq!(session.state.read().await.message_id, None);
    }
}
