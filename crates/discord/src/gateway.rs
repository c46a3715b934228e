//! [`ChatGateway`] over serenity's HTTP client and cache.

use std::sync::{Arc, OnceLock};

use {
    async_trait::async_trait,
    mediacopy_channels::{
        ChannelAccess, ChannelId, ChatGateway, Error, GuildId, InboundMessage, MessageId,
        RelayPayload, Result,
    },
    serenity::all::{
        Cache, ChannelId as DiscordChannelId, Context, CreateMessage, GuildId as DiscordGuildId,
        Http, MessageId as DiscordMessageId,
    },
    tracing::debug,
};

use crate::convert::{create_attachment, create_embed, inbound_message};

struct Handles {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

/// Gateway bound to the running serenity client on its first `ready`.
#[derive(Default)]
pub struct DiscordGateway {
    handles: OnceLock<Handles>,
}

impl DiscordGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to the client's HTTP and cache. Later calls are ignored.
    pub fn attach(&self, ctx: &Context) {
        let _ = self.handles.set(Handles {
            http: Arc::clone(&ctx.http),
            cache: Arc::clone(&ctx.cache),
        });
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.handles.get().is_some()
    }

    fn handles(&self) -> Result<&Handles> {
        self.handles
            .get()
            .ok_or_else(|| Error::unavailable("discord client is not ready"))
    }

    /// Channel name from the guild cache.
    pub fn channel_name(
        cache: &Cache,
        guild_id: Option<DiscordGuildId>,
        channel_id: DiscordChannelId,
    ) -> Option<String> {
        let guild = cache.guild(guild_id?)?;
        guild.channels.get(&channel_id).map(|c| c.name.clone())
    }
}

#[async_trait]
impl ChatGateway for DiscordGateway {
    async fn fetch_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<InboundMessage> {
        let handles = self.handles()?;
        let channel = DiscordChannelId::new(channel_id.get());
        let msg = channel
            .message(&*handles.http, DiscordMessageId::new(message_id.get()))
            .await
            .map_err(|e| Error::external(format!("fetch message {message_id}"), e))?;
        let name = Self::channel_name(&handles.cache, msg.guild_id, msg.channel_id);
        Ok(inbound_message(&msg, name))
    }

    async fn destination_access(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Option<ChannelAccess>> {
        let handles = self.handles()?;
        let guild_id = DiscordGuildId::new(guild_id.get());
        let channel_id = DiscordChannelId::new(channel_id.get());
        let me = handles.cache.current_user().id;

        let cached = handles.cache.member(guild_id, me).map(|m| m.clone());
        let member = match cached {
            Some(member) => member,
            None => guild_id
                .member(&*handles.http, me)
                .await
                .map_err(|e| Error::external("fetch bot member", e))?,
        };

        let Some(guild) = handles.cache.guild(guild_id) else {
            debug!(guild_id = %guild_id, "guild not in cache");
            return Ok(None);
        };
        Ok(guild.channels.get(&channel_id).map(|channel| {
            let permissions = guild.user_permissions_in(channel, &member);
            ChannelAccess {
                name: channel.name.clone(),
                can_send: permissions.send_messages(),
                can_attach: permissions.attach_files(),
            }
        }))
    }

    async fn send_relay(&self, channel_id: ChannelId, payload: RelayPayload) -> Result<()> {
        let handles = self.handles()?;
        let builder = CreateMessage::new()
            .embeds(payload.embeds.iter().map(create_embed).collect())
            .add_files(payload.files.iter().map(create_attachment));
        DiscordChannelId::new(channel_id.get())
            .send_message(&*handles.http, builder)
            .await
            .map_err(|e| Error::external(format!("send to channel {channel_id}"), e))?;
        Ok(())
    }
}
