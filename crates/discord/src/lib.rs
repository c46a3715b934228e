//! Discord adapter: serenity event handler, the [`ChatGateway`]
//! implementation and the slash-command surface.
//!
//! [`ChatGateway`]: mediacopy_channels::ChatGateway

pub mod bot;
pub mod commands;
pub mod convert;
pub mod gateway;
pub mod handler;
pub mod interaction;

pub use {
    bot::run,
    commands::{Command, CommandReply, ReplyField, Tone, execute},
    gateway::DiscordGateway,
    handler::MediaCopyHandler,
};
