//! JSON file-backed settings store with atomic writes.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use {
    async_trait::async_trait,
    mediacopy_channels::GuildId,
    serde::{Deserialize, Serialize},
    tokio::{fs, sync::Mutex},
    tracing::{debug, error, info, warn},
};

use crate::{
    Error, Result, migrate,
    settings::GuildSettings,
    store::{SettingsStore, SettingsUpdate, Updated, apply},
};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SettingsFile {
    version: u32,
    #[serde(default)]
    guilds: BTreeMap<GuildId, GuildSettings>,
}

/// Settings kept in memory and written through to a single JSON file on
/// every change.
pub struct FileSettingsStore {
    path: PathBuf,
    guilds: Mutex<BTreeMap<GuildId, GuildSettings>>,
}

impl FileSettingsStore {
    /// Open the store at `path`, loading existing settings.
    ///
    /// A file in the legacy layout is converted and rewritten in the current
    /// format. An unreadable file is moved aside to `<path>.corrupt` and the
    /// store starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let guilds = load(&path).await?;
        info!(path = %path.display(), guilds = guilds.len(), "loaded guild settings");
        Ok(Self {
            path,
            guilds: Mutex::new(guilds),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Merge guilds from a legacy config file. Guilds that already have
    /// settings are left untouched. Returns the number of guilds imported.
    pub async fn import_legacy(&self, legacy_path: &Path) -> Result<usize> {
        let raw = fs::read_to_string(legacy_path).await?;
        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| Error::corrupt_settings(legacy_path.display().to_string(), e))?;
        let Some(imported) = migrate::from_legacy(value) else {
            return Err(Error::message(format!(
                "{} is not a legacy bot config",
                legacy_path.display()
            )));
        };

        let mut guilds = self.guilds.lock().await;
        let mut count = 0;
        for (guild_id, settings) in imported {
            if !guilds.contains_key(&guild_id) {
                guilds.insert(guild_id, settings);
                count += 1;
            }
        }
        if count > 0 {
            write_atomic(&self.path, &guilds).await?;
        }
        info!(path = %legacy_path.display(), count, "imported legacy guild settings");
        Ok(count)
    }
}

async fn load(path: &Path) -> Result<BTreeMap<GuildId, GuildSettings>> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "no settings file yet");
        return Ok(BTreeMap::new());
    }
    let raw = fs::read_to_string(path).await?;
    let value: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            let aside = path.with_extension("json.corrupt");
            error!(
                path = %path.display(),
                moved_to = %aside.display(),
                error = %e,
                "invalid JSON in settings file, starting with empty settings"
            );
            fs::rename(path, &aside).await?;
            return Ok(BTreeMap::new());
        },
    };

    if let Some(guilds) = migrate::from_legacy(value.clone()) {
        warn!(path = %path.display(), "settings file uses the legacy layout, converting");
        write_atomic(path, &guilds).await?;
        return Ok(guilds);
    }

    let file: SettingsFile = serde_json::from_value(value)
        .map_err(|e| Error::corrupt_settings(path.display().to_string(), e))?;
    if file.version > FORMAT_VERSION {
        warn!(
            path = %path.display(),
            version = file.version,
            "settings file is newer than this build understands"
        );
    }
    Ok(file.guilds)
}

/// Write to a temp file, keep the previous file as `.bak`, rename into place.
async fn write_atomic(path: &Path, guilds: &BTreeMap<GuildId, GuildSettings>) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }
    let file = SettingsFile {
        version: FORMAT_VERSION,
        guilds: guilds.clone(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json.as_bytes()).await?;

    if fs::try_exists(path).await.unwrap_or(false) {
        let bak = path.with_extension("json.bak");
        let _ = fs::rename(path, &bak).await;
    }
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, guild_id: GuildId) -> Result<Option<GuildSettings>> {
        Ok(self.guilds.lock().await.get(&guild_id).cloned())
    }

    async fn list(&self) -> Result<Vec<(GuildId, GuildSettings)>> {
        Ok(self
            .guilds
            .lock()
            .await
            .iter()
            .map(|(id, settings)| (*id, settings.clone()))
            .collect())
    }

    async fn ensure(&self, guild_id: GuildId) -> Result<GuildSettings> {
        let mut guilds = self.guilds.lock().await;
        if let Some(existing) = guilds.get(&guild_id) {
            return Ok(existing.clone());
        }
        let settings = GuildSettings::default();
        guilds.insert(guild_id, settings.clone());
        write_atomic(&self.path, &guilds).await?;
        debug!(guild_id = %guild_id, "initialised default guild settings");
        Ok(settings)
    }

    async fn update(&self, guild_id: GuildId, update: SettingsUpdate) -> Result<Updated> {
        let mut guilds = self.guilds.lock().await;
        let is_new = !guilds.contains_key(&guild_id);
        let settings = guilds.entry(guild_id).or_default();
        let changed = apply(settings, update);
        let settings = settings.clone();
        if changed || is_new {
            write_atomic(&self.path, &guilds).await?;
        }
        Ok(Updated { settings, changed })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mediacopy_channels::ChannelId, tempfile::TempDir};

    #[tokio::test]
    async fn settings_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("guilds.json");

        let store = FileSettingsStore::open(&path).await.unwrap();
        store
            .update(
                GuildId(1),
                Box::new(|s| {
                    s.destination_channel = Some(ChannelId(10));
                    s.monitored_channels.insert(ChannelId(11));
                }),
            )
            .await
            .unwrap();
        drop(store);

        let reopened = FileSettingsStore::open(&path).await.unwrap();
        let settings = reopened.get(GuildId(1)).await.unwrap().unwrap();
        assert_eq!(settings.destination_channel, Some(ChannelId(10)));
        assert!(settings.monitored_channels.contains(&ChannelId(11)));
    }

    #[tokio::test]
    async fn backup_created_on_second_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("guilds.json");
        let store = FileSettingsStore::open(&path).await.unwrap();

        store.ensure(GuildId(1)).await.unwrap();
        store.ensure(GuildId(2)).await.unwrap();

        assert!(tmp.path().join("guilds.json.bak").exists());
        assert!(!tmp.path().join("guilds.json.tmp").exists());
    }

    #[tokio::test]
    async fn unchanged_update_does_not_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("guilds.json");
        let store = FileSettingsStore::open(&path).await.unwrap();

        store.ensure(GuildId(1)).await.unwrap();
        let updated = store
            .update(GuildId(1), Box::new(|s| s.include_author = true))
            .await
            .unwrap();
        assert!(!updated.changed);
        assert!(!tmp.path().join("guilds.json.bak").exists());
    }

    #[tokio::test]
    async fn legacy_file_is_converted_in_place() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("guilds.json");
        std::fs::write(
            &path,
            r#"{"monitored_channels": {"7": [1]}, "media_channels": {"7": 2},
                "include_author": {"7": false}, "monitor_all": {"7": false}}"#,
        )
        .unwrap();

        let store = FileSettingsStore::open(&path).await.unwrap();
        let settings = store.get(GuildId(7)).await.unwrap().unwrap();
        assert_eq!(settings.destination_channel, Some(ChannelId(2)));
        assert!(!settings.include_author);

        let rewritten: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rewritten["version"], 1);
    }

    #[tokio::test]
    async fn corrupt_file_is_moved_aside() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("guilds.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileSettingsStore::open(&path).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(tmp.path().join("guilds.json.corrupt").exists());
    }

    #[tokio::test]
    async fn import_legacy_keeps_existing_guilds() {
        let tmp = TempDir::new().unwrap();
        let legacy = tmp.path().join("bot_config.json");
        std::fs::write(
            &legacy,
            r#"{"monitored_channels": {"1": [5], "2": [6]}, "media_channels": {"1": 50, "2": 60}}"#,
        )
        .unwrap();

        let store = FileSettingsStore::open(tmp.path().join("guilds.json"))
            .await
            .unwrap();
        store
            .update(
                GuildId(1),
                Box::new(|s| s.destination_channel = Some(ChannelId(99))),
            )
            .await
            .unwrap();

        let imported = store.import_legacy(&legacy).await.unwrap();
        assert_eq!(imported, 1);
        let first = store.get(GuildId(1)).await.unwrap().unwrap();
        assert_eq!(first.destination_channel, Some(ChannelId(99)));
        let second = store.get(GuildId(2)).await.unwrap().unwrap();
        assert_eq!(second.destination_channel, Some(ChannelId(60)));
    }
}
