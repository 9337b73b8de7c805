use std::path::Path;

use {
    anyhow::{Result, bail},
    parley_config::{ParleyConfig, Severity, ValidationResult},
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Load the config the same way `run` does: explicit path or discovery,
/// then `PARLEY_*` environment overrides.
pub fn load(path: Option<&Path>) -> Result<ParleyConfig> {
    let mut config = match path {
        Some(path) => parley_config::load_config(path)?,
        None => parley_config::discover_and_load()?,
    };
    parley_config::apply_env_overrides(&mut config);
    Ok(config)
}

/// Structural checks on the file plus value checks on the resolved config.
pub fn diagnose(path: Option<&Path>) -> (ValidationResult, Option<ParleyConfig>) {
    let mut result = parley_config::validate(path);
    if result.has_errors() {
        return (result, None);
    }
    match load(path) {
        Ok(config) => {
            result.extend(parley_config::check_config(&config));
            (result, Some(config))
        },
        Err(e) => {
            result.diagnostics.push(parley_config::Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: e.to_string(),
            });
            (result, None)
        },
    }
}

pub fn check(path: Option<&Path>, verbose: bool) -> Result<()> {
    let (result, _) = diagnose(path);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults and environment.\n");
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
            Severity::Info => CYAN,
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{}{RESET} {}", d.severity, d.message);
        } else {
            eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
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
        bail!("configuration has {errors} error(s)");
    }
    Ok(())
}
