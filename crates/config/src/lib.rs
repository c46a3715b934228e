//! Configuration for mediacopy.
//!
//! Two kinds of state live here:
//!
//! - the process config (`mediacopy.toml`, `mediacopy.yaml` or
//!   `mediacopy.json`, searched in `./` then the user config dir) with
//!   `${ENV_VAR}` substitution, and
//! - the per-guild relay settings edited through slash commands, persisted
//!   by a [`SettingsStore`].

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod migrate;
pub mod schema;
pub mod settings;
pub mod store;
pub mod store_file;
pub mod store_memory;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, config_dir, data_dir, discover_and_load, load_config, settings_path,
    },
    schema::{DiscordConfig, MediaCopyConfig, MetricsConfig, RelayConfig, SettingsConfig},
    settings::GuildSettings,
    store::SettingsStore,
    store_file::FileSettingsStore,
    store_memory::MemorySettingsStore,
    validate::{Diagnostic, Severity, ValidationResult},
};
