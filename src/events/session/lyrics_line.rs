use std::sync::Arc;

use anyhow::Result;

use crate::audio::session::Lyrics;
use crate::bot::NovaBot;
use crate::events::{HandlerModule, SessionEvent};
use crate::ui::embeds;

/// Cantidad de líneas visibles en la ventana de letras.
const WINDOW_SIZE: usize = 11;
/// Líneas de contexto por encima de la línea activa.
const WINDOW_BEFORE: usize = 5;

pub fn module() -> HandlerModule {
    HandlerModule::session("lyricsLine", |ctx, event| Box::pin(run(ctx, event)))
}

/// Tick de letras: reescribe el mensaje de letras con una ventana centrada
/// en la línea activa.
async fn run(ctx: Arc<NovaBot>, event: SessionEvent) -> Result<()> {
    let SessionEvent::LyricsLine { session, line_index } = event else { return Ok(()) };
    let Some(text_channel) = session.text_channel_id else { return Ok(()) };

    let (lyrics_id, lyrics, current) = {
        let state = session.state.read().await;
        (state.lyrics_id, state.lyrics.clone(), state.queue.current.clone())
    };
    let (Some(lyrics_id), Some(lyrics)) = (lyrics_id, lyrics) else { return Ok(()) };

    let window = lyrics_window(&lyrics, line_index);
    let embed = embeds::lyrics(current.as_ref(), &lyrics.provider, &window);

    ctx.gateway.edit_embed(text_channel, lyrics_id, embed).await
}

/// Arma la ventana de líneas alrededor del índice activo, en negrita la
/// línea actual y sin las vacías.
pub(crate) fn lyrics_window(lyrics: &Lyrics, index: usize) -> String {
    let start = index.saturating_sub(WINDOW_BEFORE);
    let end = (start + WINDOW_SIZE).min(lyrics.lines.len());
    if start >= end {
        return String::new();
    }

    lyrics.lines[start..end]
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.line.is_empty())
        .map(|(offset, line)| {
            if start + offset == index {
                format!("**{}**", line.line)
            } else {
                format!("-# {}", line.line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serenity::model::id::{ChannelId, GuildId, MessageId};

    use super::*;
    use crate::audio::session::LyricsLine;
    use crate::gateway::MockGateway;
    use crate::testing::test_bot_with_gateway;

    fn lyrics(count: usize) -> Lyrics {
        Lyrics {
            provider: "genius".into(),
            lines: (0..count)
                .map(|i| LyricsLine { line: format!("line {i}"), timestamp: None })
                .collect(),
        }
    }

    #[test]
    fn window_bolds_the_active_line() {
        let window = lyrics_window(&lyrics(3), 1);
        assert_eq!(window, "-# line 0\n**line 1**\n-# line 2");
    }

    #[test]
    fn window_is_bounded_and_centered_late_in_the_song() {
        let text = lyrics_window(&lyrics(40), 20);

        assert_eq!(text.lines().count(), 11);
        assert!(text.lines().next().unwrap().contains("line 15"));
        assert!(text.contains("**line 20**"));
    }

    #[test]
    fn window_skips_empty_lines() {
        let mut lyrics = lyrics(3);
        lyrics.lines[0].line = String::new();

        let window = lyrics_window(&lyrics, 1);
        assert_eq!(window, "**line 1**\n-# line 2");
    }

    #[tokio::test]
    async fn edits_the_recorded_lyrics_message() {
        let mut gateway = MockGateway::new();
        gateway.expect_edit_embed().times(1).returning(|_, _, _| Ok(()));

        let (bot, _, _) = test_bot_with_gateway(Arc::new(gateway)).await;
        let session = bot.sessions.create(
            GuildId::new(1),
            bot.workers.all()[0].clone(),
            Some(ChannelId::new(10)),
            None,
        );

        {
            let mut state = session.state.write().await;
            state.lyrics_id = Some(MessageId::new(5));
            state.lyrics = Some(lyrics(10));
        }

        bot.emit_session(SessionEvent::LyricsLine { session, line_index: 2 }).await;
    }

    #[tokio::test]
    async fn without_a_lyrics_message_the_tick_is_ignored() {
        let gateway = MockGateway::new(); // sin expectativas: nada debe llamarse

        let (bot, _, _) = test_bot_with_gateway(Arc::new(gateway)).await;
        let session = bot.sessions.create(
            GuildId::new(1),
            bot.workers.all()[0].clone(),
            Some(ChannelId::new(10)),
            None,
        );

        bot.emit_session(SessionEvent::LyricsLine { session, line_index: 0 }).await;
    }
}
