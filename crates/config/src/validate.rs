//! Configuration validation engine.
//!
//! Detects unknown or misspelled keys in the raw file and checks the
//! resolved values the bridge cannot run without.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use secrecy::ExposeSecret;

use crate::{env_subst::substitute_env, loader, schema::ParleyConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
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
    /// Category: "syntax", "unknown-field", "type-error", "missing", "invalid"
    pub category: &'static str,
    /// Dotted path, e.g. "whatsapp.sidecar_url"
    pub path: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.severity, self.message)
        } else {
            write!(f, "{}: {}: {}", self.severity, self.path, self.message)
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone, Default)]
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

    pub fn extend(&mut self, other: ValidationResult) {
        self.diagnostics.extend(other.diagnostics);
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Leaf,
}

/// Mirrors every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    Struct(HashMap::from([
        ("discord", Struct(HashMap::from([("token", Leaf)]))),
        (
            "whatsapp",
            Struct(HashMap::from([
                ("sidecar_url", Leaf),
                ("session", Leaf),
                ("auth_dir", Leaf),
            ])),
        ),
        (
            "bridge",
            Struct(HashMap::from([("request_timeout_secs", Leaf)])),
        ),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or the discovered one if
/// `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => loader::find_config_file(),
    };

    let Some(actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Info,
                category: "missing",
                path: String::new(),
                message: "no config file found; using defaults".into(),
            }],
            config_path: None,
        };
    };

    match std::fs::read_to_string(&actual_path) {
        Ok(content) => {
            let mut result = validate_str(&substitute_env(&content), &actual_path);
            result.config_path = Some(actual_path);
            result
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("failed to read config file: {e}"),
            }],
            config_path: Some(actual_path),
        },
    }
}

/// Validate raw config text; the format is taken from `path`'s extension.
///
/// Only structural checks run here. Value checks belong to
/// [`check_config`], after environment overrides have been applied.
#[must_use]
pub fn validate_str(raw: &str, path: &Path) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let value = match loader::parse_config_value(raw, path) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("syntax error: {e}"),
            });
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&value, &build_schema_map(), "", &mut diagnostics);

    if let Err(e) = serde_json::from_value::<ParleyConfig>(value) {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        });
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// Check the resolved values the bridge needs to start.
#[must_use]
pub fn check_config(config: &ParleyConfig) -> ValidationResult {
    let mut diagnostics = Vec::new();

    if config.discord.token.expose_secret().trim().is_empty() {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "missing",
            path: "discord.token".into(),
            message: format!(
                "discord bot token is empty; set it in the config file or {}",
                loader::ENV_DISCORD_TOKEN
            ),
        });
    }

    let url = config.whatsapp.sidecar_url.as_str();
    if !(url.starts_with("ws://") || url.starts_with("wss://")) {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "invalid",
            path: "whatsapp.sidecar_url".into(),
            message: format!("sidecar url must start with ws:// or wss://, got \"{url}\""),
        });
    }

    if config.whatsapp.session.trim().is_empty() {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "invalid",
            path: "whatsapp.session".into(),
            message: "session name is empty; the sidecar will pick its own".into(),
        });
    }

    if config.bridge.request_timeout_secs == 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "invalid",
            path: "bridge.request_timeout_secs".into(),
            message: "request timeout must be greater than zero".into(),
        });
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(
    value: &serde_json::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (serde_json::Value::Object(table), KnownKeys::Struct(fields)) = (value, schema) else {
        return;
    };
    let known_keys: Vec<&str> = fields.keys().copied().collect();
    for (key, child_value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if let Some(child_schema) = fields.get(key.as_str()) {
            check_unknown_fields(child_value, child_schema, &path, diagnostics);
            continue;
        }
        let level = if prefix.is_empty() {
            " at top level"
        } else {
            ""
        };
        let message = match suggest(key, &known_keys, 3) {
            Some(s) => format!("unknown field{level} (did you mean \"{s}\"?)"),
            None => format!("unknown field{level}"),
        };
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "unknown-field",
            path,
            message,
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, secrecy::Secret};

    fn toml(raw: &str) -> ValidationResult {
        validate_str(raw, Path::new("parley.toml"))
    }

    fn valid_config() -> ParleyConfig {
        let mut cfg = ParleyConfig::default();
        cfg.discord.token = Secret::new("token".into());
        cfg
    }

    #[test]
    fn levenshtein_distances() {
        assert_eq!(levenshtein("hello", "hello"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("discrod", "discord"), 2);
        assert_eq!(levenshtein("sesion", "session"), 1);
    }

    #[test]
    fn suggest_ignores_distant_candidates() {
        assert_eq!(suggest("whatsap", &["whatsapp", "discord"], 3), Some("whatsapp"));
        assert_eq!(suggest("zzzzzzzz", &["bridge"], 3), None);
    }

    #[test]
    fn unknown_top_level_key_with_suggestion() {
        let result = toml("[discrod]\ntoken = \"x\"\n");
        let d = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field" && d.path == "discrod")
            .expect("unknown-field diagnostic");
        assert_eq!(d.severity, Severity::Error);
        assert!(d.message.contains("discord"), "{}", d.message);
    }

    #[test]
    fn unknown_nested_key_with_suggestion() {
        let result = toml("[whatsapp]\nsidecar_ulr = \"ws://x\"\n");
        let d = result
            .diagnostics
            .iter()
            .find(|d| d.path == "whatsapp.sidecar_ulr")
            .expect("unknown-field diagnostic");
        assert!(d.message.contains("sidecar_url"));
    }

    #[test]
    fn yaml_is_checked_like_toml() {
        let result = validate_str("bridge:\n  timeout: 5\n", Path::new("parley.yaml"));
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "bridge.timeout")
        );
    }

    #[test]
    fn syntax_error_detected() {
        let result = toml("[discord\n");
        assert!(result.has_errors());
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn type_error_detected() {
        let result = toml("[bridge]\nrequest_timeout_secs = \"soon\"\n");
        assert!(result.diagnostics.iter().any(|d| d.category == "type-error"));
    }

    #[test]
    fn empty_file_is_structurally_valid() {
        assert!(toml("").diagnostics.is_empty());
    }

    #[test]
    fn valid_config_has_no_diagnostics() {
        assert!(check_config(&valid_config()).diagnostics.is_empty());
    }

    #[test]
    fn empty_token_is_an_error() {
        let result = check_config(&ParleyConfig::default());
        assert!(result.has_errors());
        assert!(result.diagnostics.iter().any(|d| d.path == "discord.token"));
    }

    #[test]
    fn non_websocket_url_is_an_error() {
        let mut cfg = valid_config();
        cfg.whatsapp.sidecar_url = "http://127.0.0.1:9876".into();
        let result = check_config(&cfg);
        assert_eq!(result.count(Severity::Error), 1);
        assert_eq!(result.diagnostics[0].path, "whatsapp.sidecar_url");
    }

    #[test]
    fn zero_timeout_is_an_error() {
        let mut cfg = valid_config();
        cfg.bridge.request_timeout_secs = 0;
        assert!(check_config(&cfg).has_errors());
    }

    #[test]
    fn empty_session_is_only_a_warning() {
        let mut cfg = valid_config();
        cfg.whatsapp.session = String::new();
        let result = check_config(&cfg);
        assert!(!result.has_errors());
        assert_eq!(result.count(Severity::Warning), 1);
    }

    #[test]
    fn missing_explicit_file_is_reported() {
        let result = validate(Some(Path::new("/nonexistent/parley.toml")));
        assert!(result.has_errors());
    }

    #[test]
    fn diagnostic_display_includes_path() {
        let d = Diagnostic {
            severity: Severity::Error,
            category: "invalid",
            path: "bridge.request_timeout_secs".into(),
            message: "bad".into(),
        };
        assert_eq!(d.to_string(), "error: bridge.request_timeout_secs: bad");
    }
}
