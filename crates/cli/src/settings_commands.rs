use std::{collections::BTreeMap, path::PathBuf};

use {
    anyhow::Result,
    clap::Subcommand,
    mediacopy_config::{FileSettingsStore, MediaCopyConfig, SettingsStore, settings_path},
};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print stored guild settings as JSON.
    List,
    /// Merge a legacy bot config file into the settings store.
    Import {
        /// Path to the legacy JSON file.
        path: PathBuf,
    },
}

pub async fn handle_settings(action: &SettingsAction, config: &MediaCopyConfig) -> Result<()> {
    let store = FileSettingsStore::open(settings_path(config)).await?;
    match action {
        SettingsAction::List => println!("{}", render(&store).await?),
        SettingsAction::Import { path } => {
            let count = store.import_legacy(path).await?;
            println!("Imported {count} guild(s) into {}", store.path().display());
        },
    }
    Ok(())
}

async fn render(store: &dyn SettingsStore) -> Result<String> {
    let guilds: BTreeMap<_, _> = store.list().await?.into_iter().collect();
    Ok(serde_json::to_string_pretty(&guilds)?)
}
