//! CLI commands module
//!
//! This module contains all CLI command implementations.

pub mod config;
pub mod init;
pub mod list;
pub mod post;
pub mod remove;
pub mod vote;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use discuss_core::config::Config;
use discuss_core::QueryService;
use discuss_storage::FileSystemStore;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project directory holding config and, by default, the comment data
pub const PROJECT_DIR: &str = ".discuss";

/// discuss - threaded comment engine
#[derive(Debug, Parser)]
#[command(name = "discuss")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Data directory (overrides store.data_dir)
    #[arg(long, global = true, env = "DISCUSS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize discuss in current directory
    Init(init::InitArgs),

    /// Post a comment or a reply
    Post(post::PostArgs),

    /// Vote on a comment
    Vote(vote::VoteArgs),

    /// Report a comment, or withdraw a report
    Report(vote::ReportArgs),

    /// List comments by parent, post or creator
    List(list::ListArgs),

    /// Show the comment tree of a post
    Tree(list::TreeArgs),

    /// Show a single comment
    Show(list::ShowArgs),

    /// Remove a comment (moderation)
    Remove(remove::RemoveArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(config::ConfigCommand),
}

/// Resolved settings shared by every command
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
}

impl AppContext {
    fn resolve(cli_config: Option<PathBuf>, cli_data_dir: Option<PathBuf>) -> Result<Self> {
        let config_path = cli_config.unwrap_or_else(default_config_path);
        let config = Config::load(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
        let data_dir = resolve_data_dir(cli_data_dir, &config);
        Ok(Self {
            config,
            config_path,
            data_dir,
        })
    }

    /// Open the file store and wrap it in a query service
    pub fn open_service(&self) -> Result<QueryService> {
        debug!("Opening comment store at {}", self.data_dir.display());
        let store = FileSystemStore::open(&self.data_dir, &self.config).with_context(|| {
            format!("Failed to open comment store at {}", self.data_dir.display())
        })?;
        Ok(QueryService::new(store))
    }
}

fn default_config_path() -> PathBuf {
    PathBuf::from(PROJECT_DIR).join("config.toml")
}

/// Flag, then config, then `.discuss/` if present, then the platform data dir
fn resolve_data_dir(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    if let Some(dir) = flag.or_else(|| config.store.data_dir.clone()) {
        return dir;
    }
    let local = Path::new(PROJECT_DIR);
    if local.is_dir() {
        local.to_path_buf()
    } else {
        FileSystemStore::default_dir()
    }
}

/// Run the CLI application
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Logging comes first so config failures are still reported
    let context = AppContext::resolve(cli.config, cli.data_dir);
    let level = context
        .as_ref()
        .map(|c| c.config.log.level.clone())
        .unwrap_or_else(|_| "warn".to_string());
    setup_logging(cli.verbose, &level);

    // Handle color output
    if cli.no_color {
        colored::control::set_override(false);
    }

    let context = context?;

    // Dispatch to command handler
    match cli.command {
        Commands::Init(args) => init::execute(args, &context),
        Commands::Post(args) => post::execute(args, &context),
        Commands::Vote(args) => vote::execute_vote(args, &context),
        Commands::Report(args) => vote::execute_report(args, &context),
        Commands::List(args) => list::execute_list(args, &context),
        Commands::Tree(args) => list::execute_tree(args, &context),
        Commands::Show(args) => list::execute_show(args, &context),
        Commands::Remove(args) => remove::execute(args, &context),
        Commands::Config(cmd) => config::execute(cmd, &context),
    }
}

fn setup_logging(verbosity: u8, configured: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => EnvFilter::try_new(configured).unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_text() {
        let cmd = Cli::command();
        assert!(cmd.get_about().is_some());
    }

    #[test]
    fn test_data_dir_flag_wins() {
        let mut config = Config::default();
        config.store.data_dir = Some(PathBuf::from("/from/config"));

        assert_eq!(
            resolve_data_dir(Some(PathBuf::from("/from/flag")), &config),
            PathBuf::from("/from/flag")
        );
        assert_eq!(resolve_data_dir(None, &config), PathBuf::from("/from/config"));
    }
}
