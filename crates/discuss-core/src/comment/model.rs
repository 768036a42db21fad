//! Comment data models

use crate::types::{CommentId, PostId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A comment attached to a post, optionally replying to another comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique comment identifier
    pub id: CommentId,
    /// Identity of the author
    pub creator: String,
    /// Post the comment belongs to
    pub post: PostId,
    /// Comment this one replies to, `None` for top-level comments
    #[serde(default)]
    pub parent: Option<CommentId>,
    /// When the comment was stored
    pub date_created: DateTime<Utc>,
    /// Comment text
    pub body: String,
    /// Distance from the post-level root
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub upvotes: BTreeSet<String>,
    #[serde(default)]
    pub downvotes: BTreeSet<String>,
    #[serde(default)]
    pub reports: BTreeSet<String>,
    /// Bumped by every successful update, used for compare-and-swap
    #[serde(default)]
    pub revision: u64,
}

impl Comment {
    /// Check if this comment has no parent
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }

    /// Record an upvote, withdrawing any downvote by the same identity.
    ///
    /// Returns `false` when the record was already in that state.
    pub fn upvote(&mut self, identity: &str) -> bool {
        let removed = self.downvotes.remove(identity);
        let added = self.upvotes.insert(identity.to_string());
        removed || added
    }

    /// Record a downvote, withdrawing any upvote by the same identity.
    pub fn downvote(&mut self, identity: &str) -> bool {
        let removed = self.upvotes.remove(identity);
        let added = self.downvotes.insert(identity.to_string());
        removed || added
    }

    /// Withdraw any vote by the identity
    pub fn clear_vote(&mut self, identity: &str) -> bool {
        let up = self.upvotes.remove(identity);
        let down = self.downvotes.remove(identity);
        up || down
    }

    /// Flag the comment for moderation
    pub fn report(&mut self, identity: &str) -> bool {
        self.reports.insert(identity.to_string())
    }

    /// Withdraw a report
    pub fn withdraw_report(&mut self, identity: &str) -> bool {
        self.reports.remove(identity)
    }

    /// Check that `other` only differs from `self` in its vote and report sets
    pub fn same_identity(&self, other: &Comment) -> bool {
        self.id == other.id
            && self.creator == other.creator
            && self.post == other.post
            && self.parent == other.parent
            && self.date_created == other.date_created
            && self.body == other.body
            && self.depth == other.depth
    }
}

/// Input for inserting a comment into a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    /// Caller-chosen id; the store generates one when absent
    #[serde(default)]
    pub id: Option<CommentId>,
    pub creator: String,
    pub post: PostId,
    #[serde(default)]
    pub parent: Option<CommentId>,
    pub body: String,
    /// Defaults to the insertion instant
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
}

impl NewComment {
    /// Materialize the record once the store has resolved id and depth
    pub fn into_comment(self, id: CommentId, depth: u32, now: DateTime<Utc>) -> Comment {
        Comment {
            id,
            creator: self.creator,
            post: self.post,
            parent: self.parent,
            date_created: self.date_created.unwrap_or(now),
            body: self.body,
            depth,
            upvotes: BTreeSet::new(),
            downvotes: BTreeSet::new(),
            reports: BTreeSet::new(),
            revision: 0,
        }
    }
}

/// Vote or report change applied to a single comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteAction {
    Upvote,
    Downvote,
    ClearVote,
    Report,
    WithdrawReport,
}

impl VoteAction {
    /// Apply to a record, returning whether anything changed
    pub fn apply(self, comment: &mut Comment, identity: &str) -> bool {
        match self {
            VoteAction::Upvote => comment.upvote(identity),
            VoteAction::Downvote => comment.downvote(identity),
            VoteAction::ClearVote => comment.clear_vote(identity),
            VoteAction::Report => comment.report(identity),
            VoteAction::WithdrawReport => comment.withdraw_report(identity),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteAction::Upvote => "upvote",
            VoteAction::Downvote => "downvote",
            VoteAction::ClearVote => "clear_vote",
            VoteAction::Report => "report",
            VoteAction::WithdrawReport => "withdraw_report",
        }
    }
}

impl std::fmt::Display for VoteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
