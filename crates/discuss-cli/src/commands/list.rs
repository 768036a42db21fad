//! Read commands: list, tree and show

use super::vote::parse_id;
use super::AppContext;
use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Args};
use discuss_core::comment::{CommentNode, ScoredComment, VoteTally};
use discuss_core::types::PostId;

/// Arguments for the list command
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("filter").required(true).args(["parent", "post", "creator"])))]
pub struct ListArgs {
    /// Direct replies to this comment
    #[arg(long)]
    pub parent: Option<String>,

    /// Comments on this post
    #[arg(long)]
    pub post: Option<String>,

    /// Comments by this creator
    #[arg(long)]
    pub creator: Option<String>,

    /// Only top-level comments (with --post)
    #[arg(long, requires = "post")]
    pub top_level: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the tree command
#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Post to render
    #[arg(long)]
    pub post: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the show command
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Comment ID
    pub id: String,

    /// Also show how this identity voted
    #[arg(long)]
    pub identity: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_post(post: &str) -> Result<PostId> {
    PostId::from_string(post).context("Invalid post ID")
}

/// Execute the list command
pub fn execute_list(args: ListArgs, context: &AppContext) -> Result<()> {
    use colored::Colorize;

    let service = context.open_service()?;
    let comments = if let Some(parent) = &args.parent {
        service.find_many_by_parent_id(&parse_id(parent)?)?
    } else if let Some(post) = &args.post {
        let post = parse_post(post)?;
        if args.top_level {
            service.find_top_level_by_post_id(&post)?
        } else {
            service.find_many_by_post_id(&post)?
        }
    } else if let Some(creator) = &args.creator {
        service.find_many_by_creator(creator)?
    } else {
        bail!("One of --parent, --post or --creator is required");
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comments)?);
        return Ok(());
    }

    if comments.is_empty() {
        println!("No comments found.");
        return Ok(());
    }

    println!("{}", "Comments:".bold().underline());
    println!();
    for scored in &comments {
        print_line(scored);
    }

    Ok(())
}

fn print_line(scored: &ScoredComment) {
    use colored::Colorize;

    let c = &scored.comment;
    println!(
        "  {} [{}] {} {}: {}",
        c.id.to_string().green(),
        scored.score.to_string().yellow(),
        c.creator.cyan(),
        c.date_created.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
        c.body
    );
}

/// Execute the tree command
pub fn execute_tree(args: TreeArgs, context: &AppContext) -> Result<()> {
    use colored::Colorize;

    let post = parse_post(&args.post)?;
    let service = context.open_service()?;
    let forest = service.find_tree_by_post_id(&post)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&forest)?);
        return Ok(());
    }

    if forest.roots.is_empty() && forest.orphans.is_empty() {
        println!("No comments on {}.", post);
        return Ok(());
    }

    println!("{} {}", "Discussion on".bold(), post.to_string().cyan().bold());
    println!();

    // Explicit stack; threads can be arbitrarily deep
    let mut stack: Vec<&CommentNode> = forest.roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        let indent = "  ".repeat(node.comment.depth as usize + 1);
        println!(
            "{}{} [{}] {}: {}",
            indent,
            node.id().to_string().dimmed(),
            node.score.to_string().yellow(),
            node.comment.creator.cyan(),
            node.comment.body
        );
        stack.extend(node.children.iter().rev());
    }

    if !forest.orphans.is_empty() {
        println!();
        println!("{} {} orphaned comment(s):", "⚠".yellow(), forest.orphans.len());
        for orphan in &forest.orphans {
            println!("  {} ({})", orphan.id.to_string().dimmed(), orphan.reason);
        }
    }

    if !forest.warnings.is_empty() {
        println!();
        println!(
            "{} {} depth mismatch(es) corrected:",
            "⚠".yellow(),
            forest.warnings.len()
        );
        for warning in &forest.warnings {
            println!(
                "  {} stored {} derived {}",
                warning.id.to_string().dimmed(),
                warning.stored,
                warning.derived
            );
        }
    }

    Ok(())
}

/// Execute the show command
pub fn execute_show(args: ShowArgs, context: &AppContext) -> Result<()> {
    use colored::Colorize;

    let id = parse_id(&args.id)?;
    let service = context.open_service()?;
    let comment = service
        .store()
        .get(&id)
        .with_context(|| format!("Comment '{}' not found", args.id))?;
    let vote_state = match &args.identity {
        Some(identity) => Some(service.vote_state(&id, identity)?),
        None => None,
    };

    if args.json {
        let mut value = serde_json::to_value(ScoredComment::from(comment))?;
        if let (Some(state), Some(map)) = (vote_state, value.as_object_mut()) {
            map.insert("vote_state".to_string(), serde_json::to_value(state)?);
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Comment Details".bold().underline());
    println!();
    println!("  ID: {}", comment.id.to_string().green());
    println!("  Post: {}", comment.post.to_string().cyan());
    if let Some(parent) = &comment.parent {
        println!("  Parent: {}", parent);
    }
    println!("  Creator: {}", comment.creator);
    println!(
        "  Created: {}",
        comment.date_created.format("%Y-%m-%d %H:%M:%S")
    );
    println!("  Depth: {}", comment.depth);
    println!(
        "  Score: {} (+{} / -{})",
        VoteTally::score(&comment).to_string().yellow(),
        comment.upvotes.len(),
        comment.downvotes.len()
    );
    if !comment.reports.is_empty() {
        println!("  Reports: {}", comment.reports.len().to_string().red());
    }
    if let (Some(identity), Some(state)) = (&args.identity, vote_state) {
        println!("  Vote by {}: {}", identity, state);
    }
    println!();
    println!("{}", comment.body);

    Ok(())
}
