//! Hard gates a message must pass before it is relayed.
//!
//! Every gate fails closed: missing guild, missing settings or missing
//! destination all mean "do not relay".

use {mediacopy_channels::InboundMessage, mediacopy_config::GuildSettings};

use crate::classify::is_media;

/// First gate a message failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Ineligible {
    #[error("message is not in a guild")]
    NoGuild,
    #[error("guild has no relay settings")]
    NoSettings,
    #[error("guild has no destination channel")]
    NoDestination,
    #[error("message is in the destination channel")]
    InDestination,
    #[error("channel is excluded")]
    Excluded,
    #[error("channel is not monitored")]
    NotMonitored,
    #[error("message has no media")]
    NoMedia,
}

impl Ineligible {
    /// Short label for logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoGuild => "no_guild",
            Self::NoSettings => "no_settings",
            Self::NoDestination => "no_destination",
            Self::InDestination => "in_destination",
            Self::Excluded => "excluded",
            Self::NotMonitored => "not_monitored",
            Self::NoMedia => "no_media",
        }
    }
}

/// Channel gates only: guild, settings, destination, monitoring mode.
///
/// Used at intake, where link previews may not have rendered yet.
pub fn check_routing(
    message: &InboundMessage,
    settings: Option<&GuildSettings>,
) -> Result<(), Ineligible> {
    if message.guild_id.is_none() {
        return Err(Ineligible::NoGuild);
    }
    let settings = settings.ok_or(Ineligible::NoSettings)?;
    let destination = settings
        .destination_channel
        .ok_or(Ineligible::NoDestination)?;
    if message.channel_id == destination {
        return Err(Ineligible::InDestination);
    }
    if settings.monitor_all {
        if settings.excluded_channels.contains(&message.channel_id) {
            return Err(Ineligible::Excluded);
        }
    } else if !settings.monitored_channels.contains(&message.channel_id) {
        return Err(Ineligible::NotMonitored);
    }
    Ok(())
}

/// All gates, channel gates first and the media check last.
pub fn route(message: &InboundMessage, settings: Option<&GuildSettings>) -> Result<(), Ineligible> {
    check_routing(message, settings)?;
    if !is_media(message) {
        return Err(Ineligible::NoMedia);
    }
    Ok(())
}

#[must_use]
pub fn is_routable(message: &InboundMessage, settings: Option<&GuildSettings>) -> bool {
    check_routing(message, settings).is_ok()
}

#[must_use]
pub fn is_eligible(message: &InboundMessage, settings: Option<&GuildSettings>) -> bool {
    route(message, settings).is_ok()
}
