//! Per-guild relay settings.

use std::collections::BTreeSet;

use {
    mediacopy_channels::ChannelId,
    serde::{Deserialize, Serialize},
};

/// Relay settings of one guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildSettings {
    /// Channels relayed from when `monitor_all` is off.
    pub monitored_channels: BTreeSet<ChannelId>,
    /// Where relays are posted. Nothing is relayed until this is set.
    pub destination_channel: Option<ChannelId>,
    /// Relay from every channel except the destination and `excluded_channels`.
    pub monitor_all: bool,
    /// Channels skipped when `monitor_all` is on.
    pub excluded_channels: BTreeSet<ChannelId>,
    /// Credit the original poster in the relayed message.
    pub include_author: bool,
}

impl Default for GuildSettings {
    fn default() -> Self {
        Self {
            monitored_channels: BTreeSet::new(),
            destination_channel: None,
            monitor_all: false,
            excluded_channels: BTreeSet::new(),
            include_author: true,
        }
    }
}
