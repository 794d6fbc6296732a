//! Configuration validation engine.
//!
//! Validates configuration files against the known schema, detects
//! unknown/misspelled fields, and reports missing credentials.

use std::{collections::HashMap, path::Path};

use secrecy::ExposeSecret;

use crate::{loader, schema::RelayConfig};

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
    /// Category: "syntax", "unknown-field", "type-error", "credentials",
    /// "dispatch", "actions", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "nlu.access_token"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
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

// ── Schema tree for unknown-field detection ─────────────────────────────────

enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Array(Box<KnownKeys>),
    Leaf,
}

/// Mirror of every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Array, Leaf, Struct};

    let fields = |names: &[&'static str]| -> HashMap<&'static str, KnownKeys> {
        names.iter().map(|name| (*name, Leaf)).collect()
    };

    let mut actions = fields(&["help_text"]);
    actions.insert(
        "transit",
        Struct(fields(&["base_url", "timeout_secs", "max_departures"])),
    );
    actions.insert("help_links", Array(Box::new(Struct(fields(&["title", "url"])))));

    Struct(HashMap::from([
        ("server", Struct(fields(&["bind", "port"]))),
        (
            "messenger",
            Struct(fields(&[
                "page_access_token",
                "app_secret",
                "verify_token",
                "graph_api_url",
                "typing_indicator",
            ])),
        ),
        (
            "nlu",
            Struct(fields(&[
                "base_url",
                "access_token",
                "protocol_version",
                "lang",
                "timeout_secs",
            ])),
        ),
        (
            "dispatch",
            Struct(fields(&["pace_interval_ms", "fallback_text"])),
        ),
        ("actions", Struct(actions)),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, levenshtein(needle, c)))
        .filter(|(_, d)| *d > 0 && *d <= max_distance)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = path
        .map(Path::to_path_buf)
        .or_else(loader::find_config_file);

    let Some(ref actual_path) = config_path else {
        let mut config = RelayConfig::default();
        loader::apply_env_overrides(&mut config);
        let mut diagnostics = vec![Diagnostic {
            severity: Severity::Info,
            category: "file-ref",
            path: String::new(),
            message: "no config file found; using defaults".into(),
        }];
        check_semantics(&config, &mut diagnostics);
        return ValidationResult {
            diagnostics,
            config_path: None,
        };
    };

    let raw = match std::fs::read_to_string(actual_path) {
        Ok(raw) => raw,
        Err(e) => {
            return ValidationResult {
                diagnostics: vec![Diagnostic {
                    severity: Severity::Error,
                    category: "syntax",
                    path: String::new(),
                    message: format!("failed to read config file: {e}"),
                }],
                config_path: Some(actual_path.clone()),
            };
        },
    };

    let value = match parse_value(&raw, actual_path) {
        Ok(value) => value,
        Err(message) => {
            return ValidationResult {
                diagnostics: vec![Diagnostic {
                    severity: Severity::Error,
                    category: "syntax",
                    path: String::new(),
                    message,
                }],
                config_path: Some(actual_path.clone()),
            };
        },
    };

    let mut result = validate_value(value, true);
    result.config_path = Some(actual_path.clone());
    result
}

/// Validate a TOML string without file-system or environment side effects.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    match toml::from_str::<toml::Value>(toml_str)
        .map_err(|e| e.to_string())
        .and_then(|v| serde_json::to_value(v).map_err(|e| e.to_string()))
    {
        Ok(value) => validate_value(value, false),
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("TOML syntax error: {e}"),
            }],
            config_path: None,
        },
    }
}

fn parse_value(raw: &str, path: &Path) -> Result<serde_json::Value, String> {
    let raw = crate::env_subst::substitute_env(raw);
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    match ext {
        "toml" => toml::from_str::<toml::Value>(&raw)
            .map_err(|e| format!("TOML syntax error: {e}"))
            .and_then(|v| serde_json::to_value(v).map_err(|e| e.to_string())),
        "yaml" | "yml" => {
            serde_yaml::from_str(&raw).map_err(|e| format!("YAML syntax error: {e}"))
        },
        "json" => serde_json::from_str(&raw).map_err(|e| format!("JSON syntax error: {e}")),
        _ => Err(format!("unsupported config format: .{ext}")),
    }
}

fn validate_value(value: serde_json::Value, with_env: bool) -> ValidationResult {
    let mut diagnostics = Vec::new();

    check_unknown_fields(&value, &build_schema_map(), "", &mut diagnostics);

    match serde_json::from_value::<RelayConfig>(value) {
        Ok(mut config) => {
            if with_env {
                loader::apply_env_overrides(&mut config);
            }
            check_semantics(&config, &mut diagnostics);
        },
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        }),
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
    match (value, schema) {
        (serde_json::Value::Object(map), KnownKeys::Struct(fields)) => {
            let known: Vec<&str> = fields.keys().copied().collect();
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                match fields.get(key.as_str()) {
                    Some(child_schema) => {
                        check_unknown_fields(child, child_schema, &path, diagnostics);
                    },
                    None => {
                        let message = match suggest(key, &known, 3) {
                            Some(hint) => format!("unknown field (did you mean \"{hint}\"?)"),
                            None => "unknown field".into(),
                        };
                        diagnostics.push(Diagnostic {
                            severity: Severity::Warning,
                            category: "unknown-field",
                            path,
                            message,
                        });
                    },
                }
            }
        },
        (serde_json::Value::Array(items), KnownKeys::Array(item_schema)) => {
            for (i, item) in items.iter().enumerate() {
                check_unknown_fields(item, item_schema, &format!("{prefix}[{i}]"), diagnostics);
            }
        },
        _ => {},
    }
}

fn check_semantics(config: &RelayConfig, diagnostics: &mut Vec<Diagnostic>) {
    let mut missing = |path: &str, what: &str| {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "credentials",
            path: path.into(),
            message: format!("{what} is not set"),
        });
    };
    if config.messenger.page_access_token.expose_secret().is_empty() {
        missing("messenger.page_access_token", "page access token");
    }
    if config.messenger.app_secret.expose_secret().is_empty() {
        missing("messenger.app_secret", "app secret");
    }
    if config.nlu.access_token.expose_secret().is_empty() {
        missing("nlu.access_token", "NLU access token");
    }

    if config.messenger.verify_token == "secret" {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "credentials",
            path: "messenger.verify_token".into(),
            message: "verify token is still the default value".into(),
        });
    }

    if config.dispatch.pace_interval_ms == 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "dispatch",
            path: "dispatch.pace_interval_ms".into(),
            message: "pacing disabled; multi-part replies will arrive as one burst".into(),
        });
    } else if config.dispatch.pace_interval_ms > 10_000 {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "dispatch",
            path: "dispatch.pace_interval_ms".into(),
            message: format!(
                "{}ms between reply parts is unusually slow",
                config.dispatch.pace_interval_ms
            ),
        });
    }

    for (i, link) in config.actions.help_links.iter().enumerate() {
        if !link.url.starts_with("http") {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                category: "actions",
                path: format!("actions.help_links[{i}].url"),
                message: format!("\"{}\" is not an http(s) URL", link.url),
            });
        }
    }

    if config.actions.transit.base_url.is_none() {
        diagnostics.push(Diagnostic {
            severity: Severity::Info,
            category: "actions",
            path: "actions.transit.base_url".into(),
            message: "transit.times action disabled (no base_url)".into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE: &str = r#"
        [messenger]
        page_access_token = "page"
        app_secret = "app"
        verify_token = "custom"

        [nlu]
        access_token = "nlu"
    "#;

    #[test]
    fn levenshtein_distances() {
        assert_eq!(levenshtein("dispatch", "dispatch"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("dispach", "dispatch"), 1);
        assert_eq!(levenshtein("nlu", "nul"), 2);
    }

    #[test]
    fn complete_config_has_no_errors() {
        let result = validate_toml_str(COMPLETE);
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        assert_eq!(result.count(Severity::Warning), 0);
    }

    #[test]
    fn misspelled_section_gets_suggestion() {
        let result = validate_toml_str("[dispach]\npace_interval_ms = 1\n");
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field" && d.path == "dispach")
            .unwrap();
        assert!(diag.message.contains("\"dispatch\""));
    }

    #[test]
    fn nested_unknown_field_in_array() {
        let toml = format!("{COMPLETE}\n[[actions.help_links]]\ntitle = \"a\"\nurl = \"https://a\"\nlabel = \"x\"\n");
        let result = validate_toml_str(&toml);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "actions.help_links[0].label")
        );
    }

    #[test]
    fn missing_credentials_are_errors() {
        let result = validate_toml_str("");
        let paths: Vec<&str> = result
            .diagnostics
            .iter()
            .filter(|d| d.category == "credentials" && d.severity == Severity::Error)
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(paths, vec![
            "messenger.page_access_token",
            "messenger.app_secret",
            "nlu.access_token"
        ]);
    }

    #[test]
    fn zero_pacing_warns() {
        let toml = format!("{COMPLETE}\n[dispatch]\npace_interval_ms = 0\n");
        let result = validate_toml_str(&toml);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "dispatch.pace_interval_ms" && d.severity == Severity::Warning)
        );
    }

    #[test]
    fn type_error_reported() {
        let result = validate_toml_str("[server]\nport = \"five thousand\"\n");
        assert!(result.diagnostics.iter().any(|d| d.category == "type-error"));
    }

    #[test]
    fn syntax_error_reported() {
        let result = validate_toml_str("[server\n");
        assert!(result.has_errors());
        assert_eq!(result.diagnostics[0].category, "syntax");
    }
}
