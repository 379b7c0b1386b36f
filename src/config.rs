use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,

    // Workers de audio
    pub workers: Vec<WorkerConfig>,

    // Sesiones y resume
    pub sessions: SessionsConfig,

    // Mensajes
    pub deleter: DeleterConfig,

    // Autoplay
    pub autoplay_limit: usize,

    // Audio
    pub default_volume: u16,
    pub max_queue_size: usize,

    // Paths
    pub data_dir: PathBuf,
    pub store_prefix: String,
}

/// Un worker de audio definido en la configuración estática.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub password: String,
}

impl WorkerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SessionsConfig {
    /// Mantener la sesión viva en el worker entre reconexiones.
    pub enabled: bool,
    /// Reanudar la reproducción de las sesiones al reconectar.
    pub resume_players: bool,
    /// Ventana de resume que se arma en el worker, en milisegundos.
    pub resume_time_ms: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct DeleterConfig {
    /// Borrar el mensaje "now playing" al terminar un track, en vez de
    /// solo desarmar sus controles.
    pub on_track_end: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            // Discord
            discord_token: std::env::var("DISCORD_TOKEN")?,

            // Workers (un nodo desde el entorno)
            workers: vec![WorkerConfig {
                id: std::env::var("LAVALINK_ID").unwrap_or_else(|_| "main".to_string()),
                host: std::env::var("LAVALINK_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: std::env::var("LAVALINK_PORT")
                    .unwrap_or_else(|_| "2333".to_string())
                    .parse()?,
                password: std::env::var("LAVALINK_PASSWORD")
                    .unwrap_or_else(|_| "youshallnotpass".to_string()),
            }],

            // Sesiones
            sessions: SessionsConfig {
                enabled: std::env::var("SESSIONS_ENABLED")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()?,
                resume_players: std::env::var("RESUME_PLAYERS")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()?,
                resume_time_ms: std::env::var("RESUME_TIME_MS")
                    .unwrap_or_else(|_| "60000".to_string())
                    .parse()?,
            },

            // Mensajes
            deleter: DeleterConfig {
                on_track_end: std::env::var("DELETE_ON_TRACK_END")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()?,
            },

            // Autoplay
            autoplay_limit: std::env::var("AUTOPLAY_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,

            // Audio
            default_volume: std::env::var("DEFAULT_VOLUME")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            max_queue_size: std::env::var("MAX_QUEUE_SIZE")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,

            // Paths
            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "/app/data".to_string())
                .into(),
            store_prefix: std::env::var("STORE_PREFIX")
                .unwrap_or_else(|_| "nova:queue".to_string()),
        };

        config.validate()?;

        Ok(config)
    }

    /// Chequeos de sanidad sobre los valores cargados.
    pub fn validate(&self) -> Result<()> {
        if self.workers.is_empty() {
            anyhow::bail!("Se necesita al menos un worker de audio configurado");
        }

        if self.default_volume > 1000 {
            anyhow::bail!("El volumen por defecto no puede superar 1000, llegó: {}", self.default_volume);
        }

        if self.autoplay_limit == 0 {
            anyhow::bail!("El límite de autoplay debe ser mayor que 0");
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("El tamaño máximo de cola debe ser mayor que 0");
        }

        if self.sessions.resume_time_ms == 0 {
            anyhow::bail!("La ventana de resume debe ser mayor que 0");
        }

        if self.store_prefix.is_empty() {
            anyhow::bail!("El prefijo del almacén no puede estar vacío");
        }

        Ok(())
    }

    /// Resumen seguro de la configuración para el log de arranque.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Workers: {}\n  \
            Sesiones: persistencia={}, resume={}, ventana={}ms\n  \
            Autoplay: hasta {} tracks\n  \
            Audio: {}% vol, cola máxima {}\n  \
            Almacén: `{}` en {}",
            self.workers.iter().map(|w| w.address()).collect::<Vec<_>>().join(", "),
            self.sessions.enabled,
            self.sessions.resume_players,
            self.sessions.resume_time_ms,
            self.autoplay_limit,
            self.default_volume,
            self.max_queue_size,
            self.store_prefix,
            self.data_dir.display(),
        )
    }
}

/// Valores por defecto, pensados para desarrollo y pruebas.
impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            workers: vec![WorkerConfig {
                id: "main".to_string(),
                host: "localhost".to_string(),
                port: 2333,
                password: "youshallnotpass".to_string(),
            }],
            sessions: SessionsConfig { enabled: true, resume_players: true, resume_time_ms: 60_000 },
            deleter: DeleterConfig { on_track_end: false },
            autoplay_limit: 10,
            default_volume: 100,
            max_queue_size: 1000,
            data_dir: "/app/data".into(),
            store_prefix: "nova:queue".to_string(),
        }
    }
}
