//! Config command - View and manage KittyPress configuration
//!
//! Provides the `kittypress config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use kittypress_core::config::Config;
use tracing::info;

use crate::context::Invocation;

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "archive.extension")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, invocation: &Invocation) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(invocation),
            ConfigCommand::Set { key, value } => self.execute_set(key, value, invocation),
            ConfigCommand::Validate => self.execute_validate(invocation),
        }
    }

    fn execute_show(&self, invocation: &Invocation) -> Result<()> {
        let out = invocation.output();
        let config_path = &invocation.config_path;
        let config = Config::load_or_default(config_path);

        info!(config_path = %config_path.display(), "Showing configuration");

        if invocation.format.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            out.json(&json);
        } else {
            out.success(&format!("Configuration ({})", config_path.display()));
            out.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                out.info(line);
            }
        }

        Ok(())
    }

    fn execute_set(&self, key: &str, value: &str, invocation: &Invocation) -> Result<()> {
        let out = invocation.output();
        let config_path = &invocation.config_path;
        let mut config = Config::load_or_default(config_path);

        info!(key = %key, value = %value, "Setting configuration value");

        if let Err(e) = apply_config_value(&mut config, key, value) {
            if invocation.format.is_json() {
                out.json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "value": value,
                    "error": e.to_string(),
                }));
            } else {
                out.error(&format!("Failed to set '{}': {}", key, e));
                out.info("");
                out.info("Supported keys:");
                for (name, help) in SUPPORTED_KEYS {
                    out.info(&format!("  {name:<30} - {help}"));
                }
            }
            return Ok(());
        }

        // storage.root may name a volume that is mounted later
        let errors: Vec<String> = config
            .validate()
            .iter()
            .filter(|e| e.field != "storage.root")
            .map(ToString::to_string)
            .collect();
        if !errors.is_empty() {
            if invocation.format.is_json() {
                out.json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "value": value,
                    "errors": errors,
                }));
            } else {
                out.error(&format!(
                    "Invalid value for '{}': {}",
                    key,
                    errors.join("; ")
                ));
            }
            return Ok(());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
        }
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
        std::fs::write(config_path, yaml).context("Failed to write configuration file")?;

        if invocation.format.is_json() {
            out.json(&serde_json::json!({
                "success": true,
                "key": key,
                "value": value,
                "config_path": config_path.display().to_string(),
            }));
        } else {
            out.success(&format!("Set {} = {}", key, value));
            out.info(&format!("Saved to {}", config_path.display()));
        }
        Ok(())
    }

    fn execute_validate(&self, invocation: &Invocation) -> Result<()> {
        let out = invocation.output();
        let config_path = &invocation.config_path;

        if !config_path.exists() {
            if invocation.format.is_json() {
                out.json(&serde_json::json!({
                    "valid": false,
                    "config_path": config_path.display().to_string(),
                    "errors": ["Configuration file not found. Using defaults."],
                }));
            } else {
                out.info(&format!(
                    "Configuration file not found at {}",
                    config_path.display()
                ));
                out.info(
                    "Using default configuration. Run 'kittypress config set <key> <value>' to create one.",
                );
            }
            return Ok(());
        }

        let config = match Config::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                if invocation.format.is_json() {
                    out.json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [format!("Failed to parse configuration: {}", e)],
                    }));
                } else {
                    out.error(&format!("Failed to parse configuration: {}", e));
                    out.info(&format!("File: {}", config_path.display()));
                }
                return Ok(());
            }
        };

        info!(config_path = %config_path.display(), "Validating configuration");
        let errors = config.validate();

        if invocation.format.is_json() {
            let error_strings: Vec<String> = errors.iter().map(ToString::to_string).collect();
            out.json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            out.success("Configuration is valid");
            out.info(&format!("File: {}", config_path.display()));
        } else {
            out.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            out.info(&format!("File: {}", config_path.display()));
            out.info("");
            for error in &errors {
                out.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        Ok(())
    }
}

const SUPPORTED_KEYS: [(&str, &str); 8] = [
    ("staging.cache_dir", "Staging and output directory"),
    ("archive.extension", "Archive extension, without the dot"),
    ("archive.mime_type", "MIME type of created files"),
    ("destination.primary_authority", "Authority allowing parent inference"),
    ("storage.root", "Local directory mapped to the primary volume"),
    ("storage.state_dir", "Pending save and grants directory"),
    ("engine.program", "Archiver program"),
    ("logging.level", "trace|debug|info|warn|error"),
];

/// Apply a dot-notation key/value pair to a Config struct
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "staging.cache_dir" => config.staging.cache_dir = PathBuf::from(value),
        "archive.extension" => config.archive.extension = value.to_string(),
        "archive.mime_type" => config.archive.mime_type = value.to_string(),
        "destination.primary_authority" => {
            config.destination.primary_authority = value.to_string();
        }
        "storage.root" => config.storage.root = PathBuf::from(value),
        "storage.state_dir" => config.storage.state_dir = PathBuf::from(value),
        "engine.program" => config.engine.program = value.to_string(),
        "logging.level" => config.logging.level = value.to_string(),
        _ => anyhow::bail!("Unknown configuration key: '{}'", key),
    }
    Ok(())
}
