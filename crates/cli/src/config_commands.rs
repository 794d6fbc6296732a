use std::path::Path;

use {anyhow::Result, clap::Subcommand};

use relay_config::{
    RelayConfig,
    validate::{self, Severity},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the effective configuration with secrets redacted.
    Show,
}

pub fn handle_config(action: ConfigAction, explicit: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Check { verbose } => check(explicit, verbose),
        ConfigAction::Show => show(explicit),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(explicit: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate::validate(explicit);

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

fn show(explicit: Option<&Path>) -> Result<()> {
    let config = relay_config::discover_and_load(explicit);
    print!("{}", render_redacted(&config)?);
    Ok(())
}

const SECRET_PATHS: [(&str, &str); 3] = [
    ("messenger", "page_access_token"),
    ("messenger", "app_secret"),
    ("nlu", "access_token"),
];

/// TOML rendering of `config` with every credential masked.
fn render_redacted(config: &RelayConfig) -> Result<String> {
    let mut value = toml::Value::try_from(config)?;
    for (section, key) in SECRET_PATHS {
        if let Some(slot) = value
            .get_mut(section)
            .and_then(|s| s.get_mut(key))
            .filter(|v| v.as_str().is_some_and(|s| !s.is_empty()))
        {
            *slot = toml::Value::String("[REDACTED]".into());
        }
    }
    Ok(toml::to_string_pretty(&value)?)
}

#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    #[test]
    fn show_masks_credentials() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[messenger]
page_access_token = "EAAB-page-token"
app_secret = "shh"

[nlu]
access_token = "nlu-token"
"#
        )
        .unwrap();

        let config = relay_config::load_config(file.path()).unwrap();
        let rendered = render_redacted(&config).unwrap();
        assert!(!rendered.contains("EAAB-page-token"));
        assert!(!rendered.contains("shh"));
        assert!(!rendered.contains("nlu-token"));
        assert_eq!(rendered.matches("[REDACTED]").count(), 3);
        assert!(rendered.contains("port = 5000"));
    }

    #[test]
    fn empty_credentials_stay_empty() {
        let rendered = render_redacted(&RelayConfig::default()).unwrap();
        assert!(!rendered.contains("[REDACTED]"));
        assert!(rendered.contains("app_secret = \"\""));
    }
}
