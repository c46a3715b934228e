//! Import of the legacy single-file bot config.
//!
//! The legacy layout keys every setting by name first and guild id second:
//!
//! ```json
//! {
//!   "monitored_channels": { "123": [456, 789] },
//!   "media_channels":     { "123": 999 },
//!   "include_author":     { "123": true },
//!   "monitor_all":        { "123": false },
//!   "excluded_channels":  { "123": [] }
//! }
//! ```
//!
//! Older files lack `excluded_channels`; any missing map is treated as empty.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use {
    mediacopy_channels::{ChannelId, GuildId},
    serde::Deserialize,
    tracing::warn,
};

use crate::settings::GuildSettings;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LegacyConfig {
    monitored_channels: HashMap<String, Vec<u64>>,
    media_channels: HashMap<String, Option<u64>>,
    include_author: HashMap<String, bool>,
    monitor_all: HashMap<String, bool>,
    excluded_channels: HashMap<String, Vec<u64>>,
}

impl LegacyConfig {
    fn guild_keys(&self) -> impl Iterator<Item = &String> {
        self.monitored_channels
            .keys()
            .chain(self.media_channels.keys())
            .chain(self.include_author.keys())
            .chain(self.monitor_all.keys())
            .chain(self.excluded_channels.keys())
    }

    fn is_legacy_shape(value: &serde_json::Value) -> bool {
        value.as_object().is_some_and(|obj| {
            obj.contains_key("monitored_channels") || obj.contains_key("media_channels")
        })
    }
}

/// Convert a legacy config document into per-guild settings.
///
/// Returns `None` when `value` does not look like the legacy layout.
/// Guild keys that are not numeric ids are skipped with a warning.
pub fn from_legacy(value: serde_json::Value) -> Option<BTreeMap<GuildId, GuildSettings>> {
    if !LegacyConfig::is_legacy_shape(&value) {
        return None;
    }
    let legacy: LegacyConfig = match serde_json::from_value(value) {
        Ok(legacy) => legacy,
        Err(e) => {
            warn!(error = %e, "legacy config has unexpected value types");
            return None;
        },
    };

    let mut guilds = BTreeMap::new();
    for key in legacy.guild_keys() {
        let Ok(raw_id) = key.parse::<u64>() else {
            warn!(guild = %key, "skipping non-numeric guild id in legacy config");
            continue;
        };
        let guild_id = GuildId(raw_id);
        if guilds.contains_key(&guild_id) {
            continue;
        }
        let settings = GuildSettings {
            monitored_channels: channel_set(legacy.monitored_channels.get(key)),
            destination_channel: legacy.media_channels.get(key).copied().flatten().map(ChannelId),
            monitor_all: legacy.monitor_all.get(key).copied().unwrap_or(false),
            excluded_channels: channel_set(legacy.excluded_channels.get(key)),
            include_author: legacy.include_author.get(key).copied().unwrap_or(true),
        };
        guilds.insert(guild_id, settings);
    }
    Some(guilds)
}

fn channel_set(ids: Option<&Vec<u64>>) -> BTreeSet<ChannelId> {
    ids.map(|ids| ids.iter().copied().map(ChannelId).collect())
        .unwrap_or_default()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn converts_every_guild() {
        let legacy = json!({
            "monitored_channels": { "10": [1, 2], "20": [] },
            "media_channels": { "10": 99, "20": null },
            "include_author": { "10": false },
            "monitor_all": { "20": true },
            "excluded_channels": { "20": [7] }
        });
        let guilds = from_legacy(legacy).unwrap();
        assert_eq!(guilds.len(), 2);

        let first = &guilds[&GuildId(10)];
        assert_eq!(first.destination_channel, Some(ChannelId(99)));
        assert!(first.monitored_channels.contains(&ChannelId(2)));
        assert!(!first.include_author);
        assert!(!first.monitor_all);

        let second = &guilds[&GuildId(20)];
        assert_eq!(second.destination_channel, None);
        assert!(second.monitor_all);
        assert!(second.include_author);
        assert!(second.excluded_channels.contains(&ChannelId(7)));
    }

    #[test]
    fn missing_excluded_channels_map_is_empty() {
        let legacy = json!({
            "monitored_channels": { "10": [1] },
            "media_channels": { "10": 2 },
            "include_author": { "10": true },
            "monitor_all": { "10": false }
        });
        let guilds = from_legacy(legacy).unwrap();
        assert!(guilds[&GuildId(10)].excluded_channels.is_empty());
    }

    #[test]
    fn skips_bad_guild_keys_and_other_shapes() {
        let legacy = json!({ "monitored_channels": { "abc": [1], "5": [2] } });
        let guilds = from_legacy(legacy).unwrap();
        assert_eq!(guilds.keys().copied().collect::<Vec<_>>(), vec![GuildId(5)]);

        assert!(from_legacy(json!({ "version": 1, "guilds": {} })).is_none());
    }
}
