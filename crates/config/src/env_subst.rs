use std::sync::LazyLock;

use regex::{Captures, Regex};

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"));

/// Replace `${ENV_VAR}` placeholders in raw config text.
///
/// Unset variables are left as-is so the parse error (or the literal value)
/// points at the placeholder.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    PLACEHOLDER
        .replace_all(input, |caps: &Captures<'_>| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "DISCORD_TOKEN" => Some("tok-123".to_string()),
            "GUILDS_FILE" => Some("/var/lib/mediacopy/guilds.json".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_vars() {
        let raw = "token = \"${DISCORD_TOKEN}\"\npath = \"${GUILDS_FILE}\"";
        assert_eq!(
            substitute_env_with(raw, lookup),
            "token = \"tok-123\"\npath = \"/var/lib/mediacopy/guilds.json\""
        );
    }

    #[test]
    fn leaves_unknown_and_malformed_placeholders() {
        assert_eq!(substitute_env_with("${NOPE}", lookup), "${NOPE}");
        assert_eq!(substitute_env_with("${DISCORD_TOKEN", lookup), "${DISCORD_TOKEN");
        assert_eq!(substitute_env_with("$DISCORD_TOKEN", lookup), "$DISCORD_TOKEN");
    }
}
