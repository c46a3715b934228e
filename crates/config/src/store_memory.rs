//! In-memory settings store for tests and ephemeral runs.

use std::collections::BTreeMap;

use {async_trait::async_trait, mediacopy_channels::GuildId, tokio::sync::RwLock};

use crate::{
    Result,
    settings::GuildSettings,
    store::{SettingsStore, SettingsUpdate, Updated, apply},
};

#[derive(Default)]
pub struct MemorySettingsStore {
    guilds: RwLock<BTreeMap<GuildId, GuildSettings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `guilds`.
    pub fn with_guilds(guilds: impl IntoIterator<Item = (GuildId, GuildSettings)>) -> Self {
        Self {
            guilds: RwLock::new(guilds.into_iter().collect()),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, guild_id: GuildId) -> Result<Option<GuildSettings>> {
        Ok(self.guilds.read().await.get(&guild_id).cloned())
    }

    async fn list(&self) -> Result<Vec<(GuildId, GuildSettings)>> {
        Ok(self
            .guilds
            .read()
            .await
            .iter()
            .map(|(id, settings)| (*id, settings.clone()))
            .collect())
    }

    async fn ensure(&self, guild_id: GuildId) -> Result<GuildSettings> {
        let mut guilds = self.guilds.write().await;
        Ok(guilds.entry(guild_id).or_default().clone())
    }

    async fn update(&self, guild_id: GuildId, update: SettingsUpdate) -> Result<Updated> {
        let mut guilds = self.guilds.write().await;
        let settings = guilds.entry(guild_id).or_default();
        let changed = apply(settings, update);
        Ok(Updated {
            settings: settings.clone(),
            changed,
        })
    }
}
