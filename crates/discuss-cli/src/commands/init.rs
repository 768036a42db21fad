//! Init command
//!
//! Initialize discuss configuration and storage in a directory.

use super::{AppContext, PROJECT_DIR};
use anyhow::{Context, Result};
use clap::Args;
use discuss_core::config::Config;
use discuss_storage::FileSystemStore;
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments for the init command
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(long)]
    pub force: bool,

    /// Directory to initialize (default: current directory)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

/// Execute the init command
pub fn execute(args: InitArgs, context: &AppContext) -> Result<()> {
    use colored::Colorize;

    let project_dir = args
        .path
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    println!("Initializing discuss in {}...", project_dir.display());

    let discuss_dir = project_dir.join(PROJECT_DIR);
    let config_path = discuss_dir.join("config.toml");
    if config_path.exists() && !args.force {
        eprintln!(
            "{} discuss already initialized. Use --force to reinitialize.",
            "⚠".yellow()
        );
        return Ok(());
    }

    fs::create_dir_all(&discuss_dir).context("Failed to create .discuss directory")?;
    println!("{} Created {}/ directory", "✓".green(), PROJECT_DIR);

    fs::write(&config_path, generate_config()?).context("Failed to write config.toml")?;
    println!("{} Generated config.toml", "✓".green());

    let data_dir = data_dir_for(&project_dir, context);
    let store = FileSystemStore::open(&data_dir, &context.config)
        .with_context(|| format!("Failed to create comment store at {}", data_dir.display()))?;
    println!(
        "{} Comment store ready at {}",
        "✓".green(),
        store.comments_dir().display()
    );

    println!("\n{}", "Next steps:".bold());
    println!(
        "  {}",
        "discuss post --post <POST_ID> --creator <NAME> \"first!\"".cyan()
    );
    println!("  {}", "discuss tree --post <POST_ID>".cyan());

    Ok(())
}

/// The initialized project stores its comments next to its config, unless
/// a data directory was given explicitly
fn data_dir_for(project_dir: &Path, context: &AppContext) -> PathBuf {
    let default = FileSystemStore::default_dir();
    if context.data_dir == default || context.data_dir == Path::new(PROJECT_DIR) {
        project_dir.join(PROJECT_DIR)
    } else {
        context.data_dir.clone()
    }
}

fn generate_config() -> Result<String> {
    let body = Config::default()
        .to_toml_string()
        .context("Failed to render default configuration")?;
    Ok(format!("# discuss configuration\n\n{}", body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_round_trips() {
        let content = generate_config().unwrap();
        assert!(content.starts_with("# discuss configuration"));
        assert!(content.contains("[store]"));

        let parsed = Config::from_toml_str(&content).unwrap();
        assert_eq!(parsed.store.deadline_ms, 2000);
        assert_eq!(parsed.comment.max_body_length, 10_000);
    }

    #[test]
    fn test_explicit_data_dir_is_kept() {
        let context = AppContext {
            config: Config::default(),
            config_path: PathBuf::from(".discuss/config.toml"),
            data_dir: PathBuf::from("/srv/comments"),
        };
        assert_eq!(
            data_dir_for(Path::new("/project"), &context),
            PathBuf::from("/srv/comments")
        );
    }

    #[test]
    fn test_default_data_dir_follows_project() {
        let context = AppContext {
            config: Config::default(),
            config_path: PathBuf::from(".discuss/config.toml"),
            data_dir: FileSystemStore::default_dir(),
        };
        assert_eq!(
            data_dir_for(Path::new("/project"), &context),
            PathBuf::from("/project/.discuss")
        );
    }
}
