use {async_trait::async_trait, bytes::Bytes};

use crate::{
    Result,
    types::{ChannelId, Embed, GuildId, InboundMessage, MessageId},
};

/// Maximum number of embeds the platform accepts on a single message.
pub const MAX_EMBEDS_PER_MESSAGE: usize = 10;

/// What the bot may do in a destination channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelAccess {
    pub name: String,
    pub can_send: bool,
    pub can_attach: bool,
}

impl ChannelAccess {
    /// The bot can post a message with files in this channel.
    #[must_use]
    pub fn can_relay(&self) -> bool {
        self.can_send && self.can_attach
    }
}

/// A file re-uploaded as part of a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFile {
    pub filename: String,
    pub data: Bytes,
    pub spoiler: bool,
}

/// Files plus embeds sent to the destination channel in one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayPayload {
    pub files: Vec<OutboundFile>,
    pub embeds: Vec<Embed>,
}

/// Capability set the relay pipeline needs from the chat platform.
///
/// Connection handling and authentication belong to the implementation; the
/// pipeline only calls these operations.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Re-fetch the live version of a message.
    async fn fetch_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<InboundMessage>;

    /// Look up a destination channel and the bot's permissions in it.
    ///
    /// Returns `Ok(None)` when the channel does not exist or is not visible.
    async fn destination_access(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Option<ChannelAccess>>;

    /// Post a relay payload to a channel.
    async fn send_relay(&self, channel_id: ChannelId, payload: RelayPayload) -> Result<()>;
}
