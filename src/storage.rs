use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serenity::model::id::GuildId;
use tokio::fs;
use tracing::info;

use crate::audio::queue::StoredQueue;

/// Backend clave/valor del almacén durable. Cada operación es una llamada
/// de I/O independiente; no hay caché ni reintentos en esta capa.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn del(&self, key: &str) -> Result<()>;
}

/// Backend respaldado por archivos JSON, un archivo por clave.
pub struct JsonFileBackend {
    data_dir: PathBuf,
}

impl JsonFileBackend {
    pub async fn new(data_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("No se pudo crear el directorio {}", data_dir.display()))?;

        info!("📁 Almacén de colas inicializado en: {}", data_dir.display());
        Ok(Self { data_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // `:` no es válido en todos los sistemas de archivos
        self.data_dir.join(format!("{}.json", key.replace(':', "_")))
    }
}

#[async_trait]
impl StoreBackend for JsonFileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("No se pudo leer la clave `{key}`")),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path_for(key), value)
            .await
            .with_context(|| format!("No se pudo escribir la clave `{key}`"))
    }

    async fn del(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("No se pudo borrar la clave `{key}`")),
        }
    }
}

/// Valor aceptado por el almacén: el registro estructurado o su forma serializada.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Raw(String),
    Record(StoredQueue),
}

impl From<StoredQueue> for StoredValue {
    fn from(record: StoredQueue) -> Self {
        Self::Record(record)
    }
}

impl From<String> for StoredValue {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

impl From<&str> for StoredValue {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

/// Almacén durable de proyecciones de cola, una por guild.
///
/// Las claves llevan un prefijo de espacio de nombres para poder compartir
/// el backend con datos ajenos. Los errores del backend se propagan tal cual.
pub struct QueueStore {
    backend: Arc<dyn StoreBackend>,
    prefix: String,
}

impl QueueStore {
    pub fn new(backend: Arc<dyn StoreBackend>, prefix: impl Into<String>) -> Self {
        Self { backend, prefix: prefix.into() }
    }

    /// Construye la clave namespaced de un guild.
    pub fn build_key(&self, guild_id: GuildId) -> String {
        format!("{}:{}", self.prefix, guild_id)
    }

    /// Obtiene el valor crudo de un guild; clave ausente equivale a `""`.
    pub async fn get(&self, guild_id: GuildId) -> Result<StoredValue> {
        let data = self.backend.get(&self.build_key(guild_id)).await?;
        Ok(StoredValue::Raw(data.unwrap_or_default()))
    }

    /// Obtiene y normaliza el registro de un guild.
    pub async fn fetch(&self, guild_id: GuildId) -> Result<StoredQueue> {
        Self::parse(&self.get(guild_id).await?)
    }

    /// Persiste el valor de un guild.
    pub async fn set(&self, guild_id: GuildId, value: impl Into<StoredValue>) -> Result<()> {
        let serialized = Self::stringify(&value.into())?;
        self.backend.set(&self.build_key(guild_id), &serialized).await
    }

    /// Borra el registro de un guild.
    pub async fn delete(&self, guild_id: GuildId) -> Result<()> {
        self.backend.del(&self.build_key(guild_id)).await
    }

    /// Convierte un valor a su forma de alambre, solo si aún no lo es.
    pub fn stringify(value: &StoredValue) -> Result<String> {
        match value {
            StoredValue::Raw(raw) => Ok(raw.clone()),
            StoredValue::Record(record) => {
                serde_json::to_string(record).context("No se pudo serializar la cola")
            }
        }
    }

    /// Inversa de [`QueueStore::stringify`]; normaliza las representaciones
    /// "vacías" (cadena vacía, registro sin campos) al centinela canónico,
    /// así quien llama no distingue "nunca persistido" de "persistido vacío".
    pub fn parse(value: &StoredValue) -> Result<StoredQueue> {
        match value {
            StoredValue::Raw(raw) if raw.is_empty() => Ok(StoredQueue::default()),
            StoredValue::Raw(raw) => {
                serde_json::from_str(raw).context("No se pudo deserializar la cola")
            }
            StoredValue::Record(record) if record.is_empty() => Ok(StoredQueue::default()),
            StoredValue::Record(record) => Ok(record.clone()),
        }
    }
}
