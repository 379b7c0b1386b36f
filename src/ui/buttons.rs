use serenity::all::ButtonStyle;
use serenity::builder::{CreateActionRow, CreateButton};

use crate::audio::queue::RepeatMode;

/// IDs personalizados de los controles del reproductor
pub mod button_ids {
    pub const PLAY_PAUSE: &str = "player_pause";
    pub const SKIP: &str = "player_skip";
    pub const STOP: &str = "player_stop";
    pub const LYRICS: &str = "player_lyrics";
    pub const QUEUE: &str = "player_queue";
    pub const AUTOPLAY: &str = "player_autoplay";
    pub const LOOP: &str = "player_loop";
}

/// Crea las filas de controles del mensaje "now playing"
pub fn player_controls(paused: bool, repeat: RepeatMode, autoplay: bool) -> Vec<CreateActionRow> {
    let first = CreateActionRow::Buttons(vec![
        CreateButton::new(button_ids::STOP).style(ButtonStyle::Danger).label("Detener"),
        CreateButton::new(button_ids::SKIP).style(ButtonStyle::Secondary).label("Saltar"),
        CreateButton::new(button_ids::LYRICS).style(ButtonStyle::Secondary).label("Letra"),
        CreateButton::new(button_ids::QUEUE).style(ButtonStyle::Primary).label("Cola"),
    ]);

    let second = CreateActionRow::Buttons(vec![
        CreateButton::new(button_ids::AUTOPLAY)
            .style(if autoplay { ButtonStyle::Success } else { ButtonStyle::Secondary })
            .label("Autoplay"),
        CreateButton::new(button_ids::LOOP)
            .style(match repeat {
                RepeatMode::Off => ButtonStyle::Secondary,
                RepeatMode::Track | RepeatMode::Queue => ButtonStyle::Success,
            })
            .label(match repeat {
                RepeatMode::Off => "Repetir",
                RepeatMode::Track => "Repetir: canción",
                RepeatMode::Queue => "Repetir: cola",
            }),
        CreateButton::new(button_ids::PLAY_PAUSE)
            .style(ButtonStyle::Primary)
            .label(if paused { "Reanudar" } else { "Pausar" }),
    ]);

    vec![first, second]
}
