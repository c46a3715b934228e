//! Persistence trait for per-guild settings.

use {async_trait::async_trait, mediacopy_channels::GuildId};

use crate::{Result, settings::GuildSettings};

/// Mutation applied to one guild's settings by [`SettingsStore::update`].
pub type SettingsUpdate = Box<dyn FnOnce(&mut GuildSettings) + Send>;

/// Outcome of an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Updated {
    pub settings: GuildSettings,
    /// `false` when the mutation left the settings as they were; nothing
    /// is written in that case.
    pub changed: bool,
}

/// Storage backend for guild settings.
///
/// The relay pipeline only calls [`get`](Self::get); the command surface
/// uses the rest.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, guild_id: GuildId) -> Result<Option<GuildSettings>>;
    async fn list(&self) -> Result<Vec<(GuildId, GuildSettings)>>;
    /// Insert default settings for a guild that has none. Returns the
    /// current settings either way.
    async fn ensure(&self, guild_id: GuildId) -> Result<GuildSettings>;
    /// Apply `update` to the guild's settings, creating defaults first if needed.
    async fn update(&self, guild_id: GuildId, update: SettingsUpdate) -> Result<Updated>;
}

/// Apply `update` to `current`, reporting whether anything changed.
pub(crate) fn apply(current: &mut GuildSettings, update: SettingsUpdate) -> bool {
    let before = current.clone();
    update(current);
    *current != before
}
