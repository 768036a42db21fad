//! Remove command
//!
//! Moderation removal. Replies to the removed comment stay stored and show
//! up as orphans in the tree.

use super::vote::parse_id;
use super::AppContext;
use anyhow::{Context, Result};
use clap::Args;

/// Arguments for the remove command
#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Comment ID
    pub id: String,

    /// Skip confirmation
    #[arg(long, short)]
    pub yes: bool,
}

/// Execute the remove command
pub fn execute(args: RemoveArgs, context: &AppContext) -> Result<()> {
    use colored::Colorize;

    let id = parse_id(&args.id)?;
    let service = context.open_service()?;
    let store = service.store();

    let comment = store
        .get(&id)
        .with_context(|| format!("Comment '{}' not found", args.id))?;
    let replies = store.find_by_parent(&id)?.len();

    if !args.yes {
        use dialoguer::Confirm;

        let prompt = if replies > 0 {
            format!(
                "Remove comment by {} ({} direct repl{} will be orphaned)?",
                comment.creator,
                replies,
                if replies == 1 { "y" } else { "ies" }
            )
        } else {
            format!("Remove comment by {}?", comment.creator)
        };

        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;

        if !confirmed {
            println!("Removal cancelled.");
            return Ok(());
        }
    }

    store.remove(&id).context("Failed to remove comment")?;
    println!("{} Removed comment {}", "✓".green(), id.to_string().green());

    Ok(())
}
