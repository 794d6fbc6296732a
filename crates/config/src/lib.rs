//! Configuration loading, validation, and env substitution.
//!
//! Config files: `relay.toml`, `relay.yaml`, or `relay.json`
//! Searched in `./` then `~/.config/relay/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config,
    },
    schema::{
        ActionsConfig, DispatchConfig, HelpLink, MessengerConfig, NluConfig, RelayConfig,
        ServerConfig, TransitConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
