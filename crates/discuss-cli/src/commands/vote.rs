//! Vote and report commands

use super::AppContext;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use discuss_core::comment::{VoteAction, VoteTally};
use discuss_core::types::CommentId;

/// Vote direction
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Direction {
    /// Upvote
    Up,
    /// Downvote
    Down,
    /// Remove any vote
    Clear,
}

impl From<Direction> for VoteAction {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => VoteAction::Upvote,
            Direction::Down => VoteAction::Downvote,
            Direction::Clear => VoteAction::ClearVote,
        }
    }
}

/// Arguments for the vote command
#[derive(Debug, Args)]
pub struct VoteArgs {
    /// Vote direction
    #[arg(value_enum)]
    pub direction: Direction,

    /// Comment ID
    pub id: String,

    /// Voting identity
    #[arg(long)]
    pub identity: String,
}

/// Arguments for the report command
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Comment ID
    pub id: String,

    /// Reporting identity
    #[arg(long)]
    pub identity: String,

    /// Withdraw an earlier report
    #[arg(long)]
    pub withdraw: bool,
}

pub(crate) fn parse_id(id: &str) -> Result<CommentId> {
    CommentId::from_string(id).with_context(|| format!("Invalid comment ID: {}", id))
}

/// Execute the vote command
pub fn execute_vote(args: VoteArgs, context: &AppContext) -> Result<()> {
    apply(&args.id, args.direction.into(), &args.identity, context)
}

/// Execute the report command
pub fn execute_report(args: ReportArgs, context: &AppContext) -> Result<()> {
    let action = if args.withdraw {
        VoteAction::WithdrawReport
    } else {
        VoteAction::Report
    };
    apply(&args.id, action, &args.identity, context)
}

fn apply(id: &str, action: VoteAction, identity: &str, context: &AppContext) -> Result<()> {
    use colored::Colorize;

    let id = parse_id(id)?;
    let service = context.open_service()?;
    let comment = service
        .store()
        .apply_vote(&id, action, identity)
        .with_context(|| format!("Failed to {} comment {}", action, id))?;

    println!(
        "{} {} by {} on {}: score {}, {} report(s)",
        "✓".green(),
        action,
        identity.cyan(),
        comment.id.to_string().green(),
        VoteTally::score(&comment).to_string().yellow(),
        comment.reports.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_maps_to_action() {
        assert_eq!(VoteAction::from(Direction::Up), VoteAction::Upvote);
        assert_eq!(VoteAction::from(Direction::Down), VoteAction::Downvote);
        assert_eq!(VoteAction::from(Direction::Clear), VoteAction::ClearVote);
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(parse_id("not-a-uuid").is_err());
        let id = CommentId::new();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }
}
