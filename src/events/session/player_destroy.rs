use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::debug;

use crate::bot::NovaBot;
use crate::events::{HandlerModule, SessionEvent};

pub fn module() -> HandlerModule {
    HandlerModule::session("playerDestroy", |ctx, event| Box::pin(run(ctx, event)))
}

/// Desmonta una sesión destruida: la saca del manager y del worker, borra
/// su registro durable, apaga el estado del canal de voz y limpia sus
/// mensajes a mejor esfuerzo.
async fn run(ctx: Arc<NovaBot>, event: SessionEvent) -> Result<()> {
    let SessionEvent::PlayerDestroy { session } = event else { return Ok(()) };

    ctx.sessions.remove(session.guild_id());

    // una sesión destruida no debe revivir en el próximo resume
    ctx.store.delete(session.guild_id()).await?;

    if let Some(voice_channel) = session.voice_channel_id {
        ctx.gateway.set_voice_status(voice_channel, None).await.ok();
    }

    let lifetime = Utc::now() - session.created_at();
    debug!("🗑️ Sesión {} destruida tras {}s", session.guild_id(), lifetime.num_seconds());

    let Some(text_channel) = session.text_channel_id else { return Ok(()) };

    let (message_id, lyrics_id) = {
        let state = session.state.read().await;
        (state.message_id, state.lyrics_id)
    };

    if let Some(message_id) = message_id {
        ctx.gateway.clear_components(text_channel, message_id).await.ok();
    }

    if let Some(lyrics_id) = lyrics_id {
        ctx.gateway.delete_message(text_channel, lyrics_id).await.ok();
    }

    let mut state = session.state.write().await;
    state.message_id = None;
    state.lyrics_id = None;

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
    async fn unbinds_the_session_and_cleans_the_surface() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_set_voice_status()
            .with(eq(ChannelId::new(20)), eq(None::<String>))
            .times(1)
            .returning(|_, _| Ok(()));
        gateway.expect_clear_components().times(1).returning(|_, _| Err(anyhow::anyhow!("gone")));
        gateway.expect_delete_message().times(1).returning(|_, _| Ok(()));

        let (bot, backend, _) = test_bot_with_gateway(Arc::new(gateway)).await;
        let worker = bot.workers.all()[0].clone();
        let session = bot.sessions.create(
            GuildId::new(1),
            worker.clone(),
            Some(ChannelId::new(10)),
            Some(ChannelId::new(20)),
        );

        {
            let mut state = session.state.write().await;
            state.queue.current = Some(track("a", "youtube"));
            state.message_id = Some(MessageId::new(1));
            state.lyrics_id = Some(MessageId::new(2));
        }
        session.save_queue(&bot.store).await.unwrap();
        assert_eq!(backend.len(), 1);

        bot.emit_session(SessionEvent::PlayerDestroy { session: session.clone() }).await;

        assert!(bot.sessions.get(GuildId::new(1)).is_none());
        assert!(worker.bound_sessions().is_empty());
        // el registro durable se fue junto con la sesión
        assert_eq!(backend.len(), 0);

        let state = session.state.read().await;
        assert_eq!(state.message_id, None);
        assert_eq!(state.lyrics_id, None);
    }
}
