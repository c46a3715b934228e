use std::path::Path;

use {anyhow::Result, tracing::warn};

use mediacopy_config::validate::{self, Severity};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Refuse to start on error-level diagnostics; warnings are logged.
pub fn ensure_valid(path: Option<&Path>) -> Result<()> {
    let result = validate::validate(path);
    for d in &result.diagnostics {
        if d.severity == Severity::Warning {
            warn!(path = %d.path, "{}", d.message);
        }
    }
    match first_error(&result) {
        Some(message) => anyhow::bail!("invalid config: {message}"),
        None => Ok(()),
    }
}

fn first_error(result: &validate::ValidationResult) -> Option<String> {
    result
        .diagnostics
        .iter()
        .find(|d| d.severity == Severity::Error)
        .map(|d| {
            if d.path.is_empty() {
                d.message.clone()
            } else {
                format!("{}: {}", d.path, d.message)
            }
        })
}

/// Validate the config file and print diagnostics. Exits with status 1 on
/// any error.
pub fn check(path: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate::validate(path);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}
