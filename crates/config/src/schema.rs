use std::{collections::HashMap, path::PathBuf, time::Duration};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaCopyConfig {
    pub discord: DiscordConfig,
    pub relay: RelayConfig,
    pub settings: SettingsConfig,
    pub metrics: MetricsConfig,
}

/// Discord connection configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token. Falls back to `DISCORD_TOKEN` when empty.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Text shown as the bot's "Watching ..." activity.
    pub activity: String,

    /// Register slash commands at startup.
    pub register_commands: bool,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field("activity", &self.activity)
            .field("register_commands", &self.register_commands)
            .finish()
    }
}

impl DiscordConfig {
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            activity: "for media content".into(),
            register_commands: true,
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Timing and size limits of the relay pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Interval between scheduler ticks.
    pub batch_delay_secs: u64,
    /// Wait before relaying an ordinary candidate.
    pub wait_secs: u64,
    /// Wait before relaying a candidate whose text links to Twitter/X.
    /// Those embeds render late.
    pub twitter_wait_secs: u64,
    /// How long a delivered event id suppresses duplicate deliveries.
    pub seen_retention_secs: u64,
    /// Queue entries older than this are dropped whatever their state.
    pub stale_entry_secs: u64,
    /// Relayed-id ceiling; exceeding it trims the set to `relayed_keep`.
    pub relayed_max: usize,
    pub relayed_keep: usize,
    /// Attachments larger than this are not re-uploaded.
    pub max_attachment_bytes: u64,
    /// Original embeds copied per relay. One more slot is used by the
    /// metadata embed.
    pub max_original_embeds: usize,
    /// Message text is truncated to this many characters in the metadata embed.
    pub description_max_chars: usize,
    /// Pause before each send.
    pub send_delay_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            batch_delay_secs: 5,
            wait_secs: 3,
            twitter_wait_secs: 8,
            seen_retention_secs: 5 * 60,
            stale_entry_secs: 5 * 60,
            relayed_max: 500,
            relayed_keep: 300,
            max_attachment_bytes: 8 * 1024 * 1024,
            max_original_embeds: 9,
            description_max_chars: 1024,
            send_delay_ms: 500,
        }
    }
}

impl RelayConfig {
    #[must_use]
    pub fn batch_delay(&self) -> Duration {
        Duration::from_secs(self.batch_delay_secs)
    }

    #[must_use]
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }

    #[must_use]
    pub fn twitter_wait(&self) -> Duration {
        Duration::from_secs(self.twitter_wait_secs)
    }

    #[must_use]
    pub fn seen_retention(&self) -> Duration {
        Duration::from_secs(self.seen_retention_secs)
    }

    #[must_use]
    pub fn stale_entry_age(&self) -> Duration {
        Duration::from_secs(self.stale_entry_secs)
    }

    #[must_use]
    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_ms)
    }
}

/// Where per-guild settings are stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Path of the guild settings JSON file. Defaults to
    /// `<data_dir>/guilds.json`.
    pub path: Option<PathBuf>,
    /// Legacy single-file config to import on first start (e.g. `bot_config.json`).
    pub import_legacy: Option<PathBuf>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Additional labels added to all metrics.
    pub labels: HashMap<String, String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            labels: HashMap::new(),
        }
    }
}
