//! Post command
//!
//! Insert a top-level comment or a reply.

use super::AppContext;
use anyhow::{Context, Result};
use clap::Args;
use discuss_core::comment::CommentBuilder;
use discuss_core::types::{CommentId, PostId};

/// Arguments for the post command
#[derive(Debug, Args)]
pub struct PostArgs {
    /// Post the comment belongs to
    #[arg(long)]
    pub post: String,

    /// Author identity
    #[arg(long)]
    pub creator: String,

    /// Comment being replied to
    #[arg(long)]
    pub parent: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Comment body
    pub body: String,
}

/// Execute the post command
pub fn execute(args: PostArgs, context: &AppContext) -> Result<()> {
    use colored::Colorize;

    let post = PostId::from_string(args.post.as_str()).context("Invalid post ID")?;
    let builder = match &args.parent {
        Some(parent) => {
            let parent = CommentId::from_string(parent)
                .with_context(|| format!("Invalid comment ID: {}", parent))?;
            CommentBuilder::reply(post, parent)
        }
        None => CommentBuilder::new(post),
    };
    let new = builder
        .creator(args.creator.as_str())
        .body(args.body.as_str())
        .build()?;

    let service = context.open_service()?;
    let comment = service.store().insert(new).context("Failed to post comment")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comment)?);
        return Ok(());
    }

    println!(
        "{} Posted {} on {} (depth {})",
        "✓".green(),
        comment.id.to_string().green(),
        comment.post.to_string().cyan(),
        comment.depth
    );
    Ok(())
}
