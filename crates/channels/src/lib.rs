//! Platform-neutral message model and the gateway seam.
//!
//! The relay pipeline only ever sees the types in this crate. Platform
//! adapters (Discord via serenity) convert their own message types into
//! [`InboundMessage`] and implement [`ChatGateway`] for the outbound side.

pub mod error;
pub mod gateway;
pub mod types;

pub use {
    error::{Error, Result},
    gateway::{ChannelAccess, ChatGateway, MAX_EMBEDS_PER_MESSAGE, OutboundFile, RelayPayload},
    types::{
        Attachment, Author, ChannelId, Embed, EmbedAuthor, EmbedField, EmbedFooter, EmbedMedia,
        GuildId, InboundMessage, MessageId,
    },
};
