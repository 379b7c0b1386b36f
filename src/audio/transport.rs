use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serenity::model::id::GuildId;
use thiserror::Error;
use url::Url;

use super::track::Track;

/// Errores de la API de control del worker.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("fallo de red hacia el worker: {0}")]
    Http(#[from] reqwest::Error),
    #[error("el worker respondió {status}: {body}")]
    Status { status: u16, body: String },
    #[error("respuesta inválida del worker: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("dirección de worker inválida: {0}")]
    Address(#[from] url::ParseError),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Instrucción de reproducción o replay para un player del worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<Track>,
    pub position: u64,
    pub volume: u16,
    pub paused: bool,
}

/// Armado de la persistencia de sesión del worker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSession {
    pub resuming: bool,
    /// Ventana de resume en milisegundos.
    pub timeout: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerInfo {
    pub version: String,
}

/// Estadísticas periódicas que reporta el worker.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerStats {
    pub players: u32,
    pub playing_players: u32,
    /// Uptime del worker en milisegundos.
    pub uptime: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LoadResult {
    tracks: Vec<Track>,
}

/// API de control del worker de audio. El protocolo real queda detrás de
/// este seam; el resto del bot solo conoce estas operaciones.
#[async_trait]
pub trait WorkerTransport: Send + Sync {
    /// Handshake inicial; confirma que el worker responde.
    async fn info(&self) -> TransportResult<WorkerInfo>;
    /// Envía una instrucción de reproducción/replay para un guild.
    async fn update_player(&self, guild_id: GuildId, update: &UpdatePlayer) -> TransportResult<()>;
    /// Arma o desarma la persistencia de sesión del worker.
    async fn update_session(&self, update: &UpdateSession) -> TransportResult<()>;
    /// Resuelve tracks a partir de un identificador de búsqueda.
    async fn load_tracks(&self, identifier: &str) -> TransportResult<Vec<Track>>;
    /// Corta el streaming de letras de un guild.
    async fn unsubscribe_lyrics(&self, guild_id: GuildId) -> TransportResult<()>;
}

/// Transporte REST contra el worker.
pub struct RestTransport {
    http: reqwest::Client,
    base: Url,
    password: String,
}

impl RestTransport {
    pub fn new(address: &str, password: &str) -> TransportResult<Self> {
        let base = Url::parse(&format!("http://{address}/"))?;
        let http = reqwest::Client::new();

        Ok(Self { http, base, password: password.to_string() })
    }

    fn endpoint(&self, path: &str) -> TransportResult<Url> {
        Ok(self.base.join(path)?)
    }

    async fn check(response: reqwest::Response) -> TransportResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status { status: status.as_u16(), body })
    }
}

#[async_trait]
impl WorkerTransport for RestTransport {
    async fn info(&self) -> TransportResult<WorkerInfo> {
        let response = self
            .http
            .get(self.endpoint("v4/info")?)
            .header(AUTHORIZATION, &self.password)
            .send()
            .await?;
        let body = Self::check(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn update_player(&self, guild_id: GuildId, update: &UpdatePlayer) -> TransportResult<()> {
        let url = self.endpoint(&format!("v4/players/{guild_id}"))?;
        let response = self
            .http
            .patch(url)
            .header(AUTHORIZATION, &self.password)
            .json(update)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update_session(&self, update: &UpdateSession) -> TransportResult<()> {
        let response = self
            .http
            .patch(self.endpoint("v4/session")?)
            .header(AUTHORIZATION, &self.password)
            .json(update)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn load_tracks(&self, identifier: &str) -> TransportResult<Vec<Track>> {
        let mut url = self.endpoint("v4/loadtracks")?;
        url.set_query(Some(&format!("identifier={}", urlencoding::encode(identifier))));

        let response = self.http.get(url).header(AUTHORIZATION, &self.password).send().await?;
        let body = Self::check(response).await?.text().await?;
        let result: LoadResult = serde_json::from_str(&body)?;

        Ok(result.tracks)
    }

    async fn unsubscribe_lyrics(&self, guild_id: GuildId) -> TransportResult<()> {
        let url = self.endpoint(&format!("v4/players/{guild_id}/lyrics/subscribe"))?;
        let response = self.http.delete(url).header(AUTHORIZATION, &self.password).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
