use std::time::Duration;

use humantime::format_duration;
use serenity::all::Timestamp;
use serenity::builder::{CreateEmbed, CreateEmbedFooter};

use crate::audio::track::Track;

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const MUSIC_PURPLE: Colour = Colour::from_rgb(138, 43, 226);
    pub const NEUTRAL_GRAY: Colour = Colour::from_rgb(108, 117, 125);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "🎵 Nova Music";

/// Crea el embed de "Reproduciendo Ahora" de un track
pub fn now_playing(track: &Track, volume: u16, queue_len: usize) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title("🎵 Reproduciendo Ahora")
        .description(format!("**{}**", track.info.title))
        .color(colors::SUCCESS_GREEN)
        .field("🎤 Artista", track.info.author.clone(), true)
        .field("⏱️ Duración", track_duration(track), true)
        .field("🔊 Volumen", format!("{volume}%"), true)
        .field("📋 En cola", queue_len.to_string(), true);

    if let Some(requester) = track.requester {
        embed = embed.field("👤 Solicitado por", format!("<@{requester}>"), true);
    }

    if let Some(artwork) = &track.info.artwork_url {
        embed = embed.thumbnail(artwork);
    }

    if let Some(uri) = &track.info.uri {
        embed = embed.url(uri);
    }

    embed.timestamp(Timestamp::now()).footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea el embed del aviso de cola terminada
pub fn queue_end() -> CreateEmbed {
    CreateEmbed::default()
        .description("📭 La cola terminó. ¡Gracias por escuchar!")
        .color(colors::INFO_BLUE)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea el embed de letras con la ventana de líneas ya armada
pub fn lyrics(track: Option<&Track>, provider: &str, lines: &str) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .color(colors::MUSIC_PURPLE)
        .description(lines.to_string())
        .footer(CreateEmbedFooter::new(format!("📜 Letras de {provider}")));

    if let Some(track) = track {
        embed = embed.title(format!("📜 Letra: {}", track.info.title));
        if let Some(artwork) = &track.info.artwork_url {
            embed = embed.thumbnail(artwork);
        }
    }

    embed
}

fn track_duration(track: &Track) -> String {
    if track.info.is_stream {
        return "🔴 En vivo".to_string();
    }

    format_duration(Duration::from_secs(track.info.duration / 1000)).to_string()
}
