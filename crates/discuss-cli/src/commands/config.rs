//! Config command
//!
//! Inspect discuss configuration.

use super::AppContext;
use anyhow::{Context, Result};
use clap::Subcommand;
use discuss_core::config::Config;
use std::fs;

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show effective configuration
    Show {
        /// Show as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration
    Validate,
}

/// Execute the config command
pub fn execute(cmd: ConfigCommand, context: &AppContext) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => show_config(context, json),
        ConfigCommand::Validate => validate_config(context),
    }
}

fn show_config(context: &AppContext, as_json: bool) -> Result<()> {
    use colored::Colorize;

    if as_json {
        let json = serde_json::to_string_pretty(&context.config)?;
        println!("{}", json);
        return Ok(());
    }

    println!("{}", "Configuration:".bold().underline());
    if context.config_path.exists() {
        println!("{}", context.config_path.display().to_string().dimmed());
    } else {
        println!("{}", "(defaults, no config file)".dimmed());
    }
    println!("{} {}", "Data directory:".dimmed(), context.data_dir.display());
    println!();
    println!("{}", context.config.to_toml_string()?);

    Ok(())
}

fn validate_config(context: &AppContext) -> Result<()> {
    use colored::Colorize;

    let config_path = &context.config_path;

    if !config_path.exists() {
        eprintln!(
            "{} Configuration not found at {}; defaults apply. Run '{}' to create one.",
            "⚠".yellow(),
            config_path.display(),
            "discuss init".cyan()
        );
        return Ok(());
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    Config::from_toml_str(&content)
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    println!("{} Configuration is valid", "✓".green());
    Ok(())
}
