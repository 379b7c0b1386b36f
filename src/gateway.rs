use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serenity::builder::{CreateActionRow, CreateEmbed, CreateMessage, EditMessage};
use serenity::http::Http;
use serenity::model::id::{ChannelId, MessageId};

/// Superficie mínima del gateway de chat que usan los handlers.
///
/// Los handlers tratan estas llamadas como mejor-esfuerzo cuando limpian
/// UI; el detalle de transporte queda detrás de este seam.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Publica un embed con componentes y devuelve el id del mensaje.
    async fn send(
        &self,
        channel: ChannelId,
        embed: CreateEmbed,
        components: Vec<CreateActionRow>,
    ) -> Result<MessageId>;

    /// Reemplaza el embed de un mensaje existente.
    async fn edit_embed(&self, channel: ChannelId, message: MessageId, embed: CreateEmbed) -> Result<()>;

    /// Desarma los controles interactivos de un mensaje.
    async fn clear_components(&self, channel: ChannelId, message: MessageId) -> Result<()>;

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()>;

    /// Fija o borra el estado del canal de voz.
    async fn set_voice_status(&self, channel: ChannelId, status: Option<String>) -> Result<()>;
}

/// Implementación del gateway sobre la API HTTP de Discord.
pub struct DiscordGateway {
    http: Arc<Http>,
    rest: reqwest::Client,
    token: String,
}

impl DiscordGateway {
    pub fn new(token: &str) -> Self {
        Self {
            http: Arc::new(Http::new(token)),
            rest: reqwest::Client::new(),
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl Gateway for DiscordGateway {
    async fn send(
        &self,
        channel: ChannelId,
        embed: CreateEmbed,
        components: Vec<CreateActionRow>,
    ) -> Result<MessageId> {
        let message = channel
            .send_message(&self.http, CreateMessage::new().embed(embed).components(components))
            .await
            .context("No se pudo publicar el mensaje")?;

        Ok(message.id)
    }

    async fn edit_embed(&self, channel: ChannelId, message: MessageId, embed: CreateEmbed) -> Result<()> {
        channel
            .edit_message(&self.http, message, EditMessage::new().embed(embed))
            .await
            .context("No se pudo editar el mensaje")?;

        Ok(())
    }

    async fn clear_components(&self, channel: ChannelId, message: MessageId) -> Result<()> {
        channel
            .edit_message(&self.http, message, EditMessage::new().components(Vec::new()))
            .await
            .context("No se pudo desarmar el mensaje")?;

        Ok(())
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()> {
        channel
            .delete_message(&self.http, message)
            .await
            .context("No se pudo borrar el mensaje")?;

        Ok(())
    }

    async fn set_voice_status(&self, channel: ChannelId, status: Option<String>) -> Result<()> {
        // serenity todavía no expone esta ruta
        let url = format!("https://discord.com/api/v10/channels/{channel}/voice-status");

        self.rest
            .put(url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await
            .context("No se pudo actualizar el estado de voz")?
            .error_for_status()
            .context("Discord rechazó el estado de voz")?;

        Ok(())
    }
}
