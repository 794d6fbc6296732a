use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::RelayConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["relay.toml", "relay.yaml", "relay.yml", "relay.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<RelayConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config, then apply environment overrides.
///
/// Search order:
/// 1. `explicit` when given
/// 2. `./relay.{toml,yaml,yml,json}` (project-local)
/// 3. `~/.config/relay/relay.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `RelayConfig::default()` if no config file is found or the
/// file fails to parse.
pub fn discover_and_load(explicit: Option<&Path>) -> RelayConfig {
    let path = explicit.map(Path::to_path_buf).or_else(find_config_file);
    let mut config = match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                RelayConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            RelayConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
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

/// Returns the user-global config directory (`~/.config/relay/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "relay").map(|d| d.config_dir().to_path_buf())
}

/// Overlay well-known environment variables onto a loaded config.
///
/// Hosted deployments usually inject credentials this way instead of
/// writing them to the config file.
pub fn apply_env_overrides(config: &mut RelayConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut RelayConfig, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(token) = lookup("RELAY_PAGE_ACCESS_TOKEN") {
        config.messenger.page_access_token = Secret::new(token);
    }
    if let Some(secret) = lookup("RELAY_APP_SECRET") {
        config.messenger.app_secret = Secret::new(secret);
    }
    if let Some(verify) = lookup("RELAY_VERIFY_TOKEN") {
        config.messenger.verify_token = verify;
    }
    if let Some(token) = lookup("RELAY_NLU_TOKEN") {
        config.nlu.access_token = Secret::new(token);
    }
    if let Some(port) = lookup("PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!(%port, error = %e, "ignoring invalid PORT"),
        }
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<RelayConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
