use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::MediaCopyConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "mediacopy.toml",
    "mediacopy.yaml",
    "mediacopy.yml",
    "mediacopy.json",
];

/// Environment variable holding the bot token when the config has none.
pub const TOKEN_ENV: &str = "DISCORD_TOKEN";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<MediaCopyConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./mediacopy.{toml,yaml,yml,json}`
/// 2. `~/.config/mediacopy/mediacopy.{toml,yaml,yml,json}`
///
/// Returns `MediaCopyConfig::default()` if no config file is found or the
/// file fails to parse.
pub fn discover_and_load() -> MediaCopyConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    MediaCopyConfig::default()
}

/// Find the first config file in standard locations.
pub(crate) fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/mediacopy/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "mediacopy").map(|d| d.config_dir().to_path_buf())
}

/// Returns the user data directory, where guild settings live by default.
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "mediacopy").map(|d| d.data_dir().to_path_buf())
}

/// Fill values the config file left empty from the environment.
///
/// Currently only the bot token (`DISCORD_TOKEN`).
pub fn apply_env_overrides(config: &mut MediaCopyConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut MediaCopyConfig, lookup: impl Fn(&str) -> Option<String>) {
    if !config.discord.has_token()
        && let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.trim().is_empty())
    {
        config.discord.token = Secret::new(token);
    }
}

/// Resolve the guild settings file path: explicit config value, else
/// `<data_dir>/guilds.json`, else `./guilds.json`.
pub fn settings_path(config: &MediaCopyConfig) -> PathBuf {
    config.settings.path.clone().unwrap_or_else(|| {
        data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("guilds.json")
    })
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<MediaCopyConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, secrecy::ExposeSecret, tempfile::TempDir};

    #[rstest]
    #[case("mediacopy.toml", "[relay]\nbatch_delay_secs = 7\n")]
    #[case("mediacopy.yaml", "relay:\n  batch_delay_secs: 7\n")]
    #[case("mediacopy.json", r#"{"relay": {"batch_delay_secs": 7}}"#)]
    fn loads_every_format(#[case] name: &str, #[case] body: &str) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(name);
        std::fs::write(&path, body).unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.relay.batch_delay_secs, 7);
        assert_eq!(cfg.relay.wait_secs, 3);
    }

    #[test]
    fn rejects_unknown_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mediacopy.ini");
        std::fs::write(&path, "x").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn token_falls_back_to_env() {
        let mut cfg = MediaCopyConfig::default();
        apply_env_overrides_with(&mut cfg, |name| {
            (name == TOKEN_ENV).then(|| "from-env".to_string())
        });
        assert_eq!(cfg.discord.token.expose_secret(), "from-env");
    }

    #[test]
    fn configured_token_wins_over_env() {
        let mut cfg = MediaCopyConfig::default();
        cfg.discord.token = Secret::new("from-file".into());
        apply_env_overrides_with(&mut cfg, |_| Some("from-env".to_string()));
        assert_eq!(cfg.discord.token.expose_secret(), "from-file");
    }

    #[test]
    fn explicit_settings_path_is_used() {
        let mut cfg = MediaCopyConfig::default();
        cfg.settings.path = Some(PathBuf::from("/tmp/guilds.json"));
        assert_eq!(settings_path(&cfg), PathBuf::from("/tmp/guilds.json"));
    }
}
