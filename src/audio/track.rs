use serde::{Deserialize, Serialize};
use serenity::model::id::UserId;

/// Nombres de fuente que entiende el motor de autoplay.
pub mod sources {
    pub const SPOTIFY: &str = "spotify";
    pub const YOUTUBE: &str = "youtube";
    pub const YOUTUBE_MUSIC: &str = "youtubemusic";
}

/// Track tal como lo entrega el worker de audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Blob opaco que el worker usa para reproducir sin resolver de nuevo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded: Option<String>,
    pub info: TrackInfo,
    /// Usuario que pidió el track; `None` para tracks encolados por autoplay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<UserId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackInfo {
    pub identifier: String,
    pub title: String,
    pub author: String,
    pub uri: Option<String>,
    pub artwork_url: Option<String>,
    /// Duración en milisegundos. `0` para streams en vivo.
    pub duration: u64,
    pub is_stream: bool,
    pub source_name: String,
}

impl Track {
    /// Identidad de un track a efectos de deduplicación.
    pub fn is_same(&self, other: &Track) -> bool {
        self.info.identifier == other.info.identifier
    }
}
