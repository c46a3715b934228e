//! Slash-command semantics, independent of the Discord API.
//!
//! [`execute`] applies a parsed [`Command`] to a guild's settings and
//! returns the reply to show. Rendering and parsing live in
//! [`crate::interaction`].

use std::fmt::Write as _;

use {
    mediacopy_channels::{ChannelId, GuildId},
    mediacopy_config::{GuildSettings, Result, SettingsStore, store::Updated},
    tracing::info,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/setup channel`
    Setup { channel: ChannelId },
    /// `/monitor add channel`
    MonitorAdd { channel: ChannelId },
    /// `/monitor remove channel`
    MonitorRemove { channel: ChannelId },
    /// `/monitor exclude channel`
    MonitorExclude { channel: ChannelId },
    /// `/monitor include channel`
    MonitorInclude { channel: ChannelId },
    /// `/monitor all [enabled]`; `None` toggles.
    MonitorAll { enabled: Option<bool> },
    /// `/monitor list`
    MonitorList,
    /// `/toggle_author`
    ToggleAuthor,
    /// `/help`
    Help,
}

impl Command {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Setup { .. } => "setup",
            Self::MonitorAdd { .. } => "monitor add",
            Self::MonitorRemove { .. } => "monitor remove",
            Self::MonitorExclude { .. } => "monitor exclude",
            Self::MonitorInclude { .. } => "monitor include",
            Self::MonitorAll { .. } => "monitor all",
            Self::MonitorList => "monitor list",
            Self::ToggleAuthor => "toggle_author",
            Self::Help => "help",
        }
    }
}

/// Reply colour family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    /// Nothing changed ("already monitoring", ...).
    Notice,
    Info,
    Error,
}

impl Tone {
    #[must_use]
    pub fn colour(self) -> u32 {
        match self {
            Self::Success => 0x00ff00,
            Self::Notice => 0xffff00,
            Self::Info => 0x0099ff,
            Self::Error => 0xff0000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub tone: Tone,
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<ReplyField>,
    /// Only the invoking user sees the reply.
    pub ephemeral: bool,
}

impl CommandReply {
    fn new(tone: Tone, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            tone,
            title: title.into(),
            description: Some(description.into()),
            fields: Vec::new(),
            ephemeral: false,
        }
    }

    #[must_use]
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            ephemeral: true,
            ..Self::new(Tone::Error, "❌ Error", description)
        }
    }

    fn field(mut self, name: &str, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(ReplyField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

fn mention(channel: ChannelId) -> String {
    format!("<#{channel}>")
}

/// Apply `command` to `guild_id`'s settings.
///
/// # Errors
///
/// Fails only when the settings store cannot be read or written.
pub async fn execute(
    command: Command,
    guild_id: GuildId,
    store: &dyn SettingsStore,
) -> Result<CommandReply> {
    info!(guild_id = %guild_id, command = command.name(), "running command");
    let reply = match command {
        Command::Setup { channel } => {
            store
                .update(
                    guild_id,
                    Box::new(move |s| s.destination_channel = Some(channel)),
                )
                .await?;
            CommandReply::new(
                Tone::Success,
                "✅ Media Channel Set",
                format!("Media will be copied to {}", mention(channel)),
            )
        },
        Command::MonitorAdd { channel } => {
            let Updated { changed, .. } = store
                .update(
                    guild_id,
                    Box::new(move |s| {
                        s.monitored_channels.insert(channel);
                    }),
                )
                .await?;
            if changed {
                CommandReply::new(
                    Tone::Success,
                    "✅ Channel Added",
                    format!("Now monitoring {} for media", mention(channel)),
                )
            } else {
                CommandReply::new(
                    Tone::Notice,
                    "ℹ️ Already Monitoring",
                    format!("Already monitoring {}", mention(channel)),
                )
            }
        },
        Command::MonitorRemove { channel } => {
            let Updated { changed, .. } = store
                .update(
                    guild_id,
                    Box::new(move |s| {
                        s.monitored_channels.remove(&channel);
                    }),
                )
                .await?;
            if changed {
                CommandReply::new(
                    Tone::Success,
                    "✅ Channel Removed",
                    format!("No longer monitoring {}", mention(channel)),
                )
            } else {
                CommandReply::new(
                    Tone::Notice,
                    "ℹ️ Not Monitoring",
                    format!("Was not monitoring {}", mention(channel)),
                )
            }
        },
        Command::MonitorExclude { channel } => {
            let Updated { changed, .. } = store
                .update(
                    guild_id,
                    Box::new(move |s| {
                        s.excluded_channels.insert(channel);
                    }),
                )
                .await?;
            if changed {
                CommandReply::new(
                    Tone::Success,
                    "✅ Channel Excluded",
                    format!(
                        "Excluded {} from monitoring (when monitor all is enabled)",
                        mention(channel)
                    ),
                )
            } else {
                CommandReply::new(
                    Tone::Notice,
                    "ℹ️ Already Excluded",
                    format!("Already excluding {}", mention(channel)),
                )
            }
        },
        Command::MonitorInclude { channel } => {
            let Updated { changed, .. } = store
                .update(
                    guild_id,
                    Box::new(move |s| {
                        s.excluded_channels.remove(&channel);
                    }),
                )
                .await?;
            if changed {
                CommandReply::new(
                    Tone::Success,
                    "✅ Channel Included",
                    format!("Removed {} from exclusion list", mention(channel)),
                )
            } else {
                CommandReply::new(
                    Tone::Notice,
                    "ℹ️ Not Excluded",
                    format!("Was not excluding {}", mention(channel)),
                )
            }
        },
        Command::MonitorAll { enabled } => {
            let Updated { settings, .. } = store
                .update(
                    guild_id,
                    Box::new(move |s| {
                        let enabled = enabled.unwrap_or(!s.monitor_all);
                        s.monitor_all = enabled;
                        if enabled {
                            s.monitored_channels.clear();
                        }
                    }),
                )
                .await?;
            let status = match (settings.monitor_all, settings.excluded_channels.len()) {
                (false, _) => "📍 Switched to monitoring **specific channels only**".to_string(),
                (true, 0) => "🌐 Now monitoring **all channels** (except destination)".to_string(),
                (true, excluded) => format!(
                    "🌐 Now monitoring **all channels** (except destination + {excluded} excluded)"
                ),
            };
            CommandReply::new(Tone::Success, "✅ Monitor Mode Updated", status)
        },
        Command::MonitorList => {
            let settings = store.get(guild_id).await?.unwrap_or_default();
            status_reply(&settings)
        },
        Command::ToggleAuthor => {
            let Updated { settings, .. } = store
                .update(
                    guild_id,
                    Box::new(|s| s.include_author = !s.include_author),
                )
                .await?;
            let status = if settings.include_author {
                "enabled"
            } else {
                "disabled"
            };
            CommandReply::new(
                Tone::Success,
                "✅ Author Attribution Updated",
                format!("Author attribution is now **{status}**"),
            )
        },
        Command::Help => help_reply(),
    };
    Ok(reply)
}

fn channel_list(channels: impl IntoIterator<Item = ChannelId>) -> Option<String> {
    let mut out = String::new();
    for channel in channels {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(out, "{}", mention(channel));
    }
    (!out.is_empty()).then_some(out)
}

fn status_reply(settings: &GuildSettings) -> CommandReply {
    let mut reply = CommandReply {
        description: None,
        ..CommandReply::new(Tone::Info, "📺 Media Monitoring Status", "")
    };
    reply = reply.field(
        "📸 Media Channel",
        settings
            .destination_channel
            .map(mention)
            .unwrap_or_else(|| "Not configured (use `/setup`)".into()),
        false,
    );
    if settings.monitor_all {
        reply = reply
            .field("🌐 Monitor Mode", "All channels (except destination)", false)
            .field(
                "🚫 Excluded Channels",
                channel_list(settings.excluded_channels.iter().copied())
                    .unwrap_or_else(|| "None".into()),
                false,
            );
    } else {
        reply = reply.field(
            "📍 Monitored Channels",
            channel_list(settings.monitored_channels.iter().copied())
                .unwrap_or_else(|| "None (use `/monitor add`)".into()),
            false,
        );
    }
    reply.field(
        "👤 Author Attribution",
        if settings.include_author {
            "Enabled"
        } else {
            "Disabled"
        },
        true,
    )
}

fn help_reply() -> CommandReply {
    CommandReply::new(
        Tone::Info,
        "📸 Media Copy Bot Help",
        "This bot copies media content (images, videos, GIFs) to a designated channel.",
    )
    .field(
        "Setup Commands",
        "`/setup #channel` - Set the media destination channel\n\
         `/monitor add #channel` - Add a channel to monitor\n\
         `/monitor remove #channel` - Stop monitoring a channel\n\
         `/monitor all` - Toggle monitoring all channels\n\
         `/monitor exclude #channel` - Exclude channel from monitor all\n\
         `/monitor include #channel` - Remove channel from exclusions\n\
         `/monitor list` - Show current configuration",
        false,
    )
    .field(
        "Other Commands",
        "`/toggle_author` - Toggle showing who posted the media\n\
         `/help` - Show this help message",
        false,
    )
    .field(
        "What gets copied?",
        "• Directly uploaded images/videos/GIFs\n\
         • Embedded media from URLs (previews)\n\
         • Does NOT copy plain text links",
        false,
    )
}
