//! Configuration validation.
//!
//! Detects unknown or misspelled keys and relay limits that cannot work
//! together (a keep count above the ceiling, an embed budget the platform
//! would reject, ...).

use std::path::{Path, PathBuf};

use crate::schema::MediaCopyConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "limits", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "relay.wait_secs"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Known keys per section. Kept in sync with `schema.rs`.
const KNOWN_SECTIONS: &[(&str, &[&str])] = &[
    ("discord", &["token", "activity", "register_commands"]),
    (
        "relay",
        &[
            "batch_delay_secs",
            "wait_secs",
            "twitter_wait_secs",
            "seen_retention_secs",
            "stale_entry_secs",
            "relayed_max",
            "relayed_keep",
            "max_attachment_bytes",
            "max_original_embeds",
            "description_max_chars",
            "send_delay_ms",
        ],
    ),
    ("settings", &["path", "import_legacy"]),
    ("metrics", &["enabled", "labels"]),
];

/// Validate the config file at `path`, or the discovered one when `None`.
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Info,
                "file-ref",
                "",
                "no config file found; using defaults",
            )],
            config_path: None,
        };
    };

    let is_toml = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .is_none_or(|e| e == "toml");

    match std::fs::read_to_string(actual_path) {
        Ok(content) if is_toml => {
            let mut result = validate_toml_str(&content);
            result.config_path = Some(actual_path.clone());
            result
        },
        Ok(_) => {
            let mut diagnostics = Vec::new();
            match crate::loader::load_config(actual_path) {
                Ok(config) => check_limits(&config, &mut diagnostics),
                Err(e) => diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    "type-error",
                    "",
                    format!("failed to parse config: {e}"),
                )),
            }
            ValidationResult {
                diagnostics,
                config_path: Some(actual_path.clone()),
            }
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            )],
            config_path: Some(actual_path.clone()),
        },
    }
}

/// Validate a TOML string without file-system side effects.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("TOML syntax error: {e}"),
            ));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    if let Some(root) = toml_value.as_table() {
        check_unknown_fields(root, &mut diagnostics);
    }

    match toml::from_str::<MediaCopyConfig>(toml_str) {
        Ok(config) => check_limits(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(root: &toml::Table, diagnostics: &mut Vec<Diagnostic>) {
    for (section, value) in root {
        let Some((_, fields)) = KNOWN_SECTIONS
            .iter()
            .find(|(name, _)| *name == section.as_str())
        else {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "unknown-field",
                section.clone(),
                format!("unknown section `{section}`"),
            ));
            continue;
        };
        let Some(table) = value.as_table() else {
            continue;
        };
        for key in table.keys() {
            if !fields.contains(&key.as_str()) {
                diagnostics.push(Diagnostic::new(
                    Severity::Warning,
                    "unknown-field",
                    format!("{section}.{key}"),
                    format!("unknown field `{key}` in [{section}]"),
                ));
            }
        }
    }
}

fn check_limits(config: &MediaCopyConfig, diagnostics: &mut Vec<Diagnostic>) {
    let relay = &config.relay;

    if relay.batch_delay_secs == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "limits",
            "relay.batch_delay_secs",
            "batch delay must be at least one second",
        ));
    }
    if relay.relayed_keep > relay.relayed_max {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "limits",
            "relay.relayed_keep",
            format!(
                "relayed_keep ({}) exceeds relayed_max ({})",
                relay.relayed_keep, relay.relayed_max
            ),
        ));
    }
    if relay.max_original_embeds + 1 > mediacopy_channels::MAX_EMBEDS_PER_MESSAGE {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "limits",
            "relay.max_original_embeds",
            format!(
                "at most {} original embeds fit next to the metadata embed",
                mediacopy_channels::MAX_EMBEDS_PER_MESSAGE - 1
            ),
        ));
    }
    if relay.twitter_wait_secs < relay.wait_secs {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "limits",
            "relay.twitter_wait_secs",
            "Twitter/X wait is shorter than the default wait",
        ));
    }
    if relay.stale_entry_secs <= relay.twitter_wait_secs {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "limits",
            "relay.stale_entry_secs",
            "queue entries would be dropped before their wait window ends",
        ));
    }
    if relay.description_max_chars > 4096 {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "limits",
            "relay.description_max_chars",
            "embed descriptions above 4096 characters are rejected by Discord",
        ));
    }
    if !config.discord.has_token() {
        diagnostics.push(Diagnostic::new(
            Severity::Info,
            "file-ref",
            "discord.token",
            "no token in config; DISCORD_TOKEN will be used",
        ));
    }
}
