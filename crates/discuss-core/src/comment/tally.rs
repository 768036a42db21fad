//! Vote tallies

use super::model::Comment;
use serde::{Deserialize, Serialize};

/// How a given identity voted on a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteState {
    Upvoted,
    Downvoted,
    None,
}

impl std::fmt::Display for VoteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoteState::Upvoted => write!(f, "Upvoted"),
            VoteState::Downvoted => write!(f, "Downvoted"),
            VoteState::None => write!(f, "None"),
        }
    }
}

/// Pure functions over a comment's vote sets
pub struct VoteTally;

impl VoteTally {
    /// Net score, upvotes minus downvotes
    pub fn score(comment: &Comment) -> i64 {
        comment.upvotes.len() as i64 - comment.downvotes.len() as i64
    }

    /// Vote state of `identity`.
    ///
    /// An identity found in both sets resolves to `Upvoted`. Stores never
    /// produce that state through their vote operations, but persisted
    /// records may carry it.
    pub fn vote_state(comment: &Comment, identity: &str) -> VoteState {
        if comment.upvotes.contains(identity) {
            VoteState::Upvoted
        } else if comment.downvotes.contains(identity) {
            VoteState::Downvoted
        } else {
            VoteState::None
        }
    }
}

/// A comment annotated with its score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub score: i64,
}

impl From<Comment> for ScoredComment {
    fn from(comment: Comment) -> Self {
        let score = VoteTally::score(&comment);
        Self { comment, score }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::model::NewComment;
    use crate::types::{CommentId, PostId};
    use chrono::Utc;

    fn comment() -> Comment {
        NewComment {
            id: None,
            creator: "alice".to_string(),
            post: PostId("p".to_string()),
            parent: None,
            body: "body".to_string(),
            date_created: None,
        }
        .into_comment(CommentId::new(), 0, Utc::now())
    }

    #[test]
    fn test_score_counts_sets() {
        let mut c = comment();
        assert_eq!(VoteTally::score(&c), 0);
        c.upvote("a");
        c.upvote("b");
        c.downvote("c");
        assert_eq!(VoteTally::score(&c), 1);
    }

    #[test]
    fn test_negative_score() {
        let mut c = comment();
        c.downvote("a");
        c.downvote("b");
        assert_eq!(VoteTally::score(&c), -2);
    }

    #[test]
    fn test_vote_state() {
        let mut c = comment();
        c.upvote("a");
        c.downvote("b");
        assert_eq!(VoteTally::vote_state(&c, "a"), VoteState::Upvoted);
        assert_eq!(VoteTally::vote_state(&c, "b"), VoteState::Downvoted);
        assert_eq!(VoteTally::vote_state(&c, "z"), VoteState::None);
    }

    #[test]
    fn test_both_sets_resolves_to_upvoted() {
        let mut c = comment();
        c.upvotes.insert("alice".to_string());
        c.downvotes.insert("alice".to_string());
        assert_eq!(VoteTally::vote_state(&c, "alice"), VoteState::Upvoted);
        assert_eq!(VoteTally::score(&c), 0);
    }

    #[test]
    fn test_scored_comment_flattens() {
        let mut c = comment();
        c.upvote("x");
        let scored = ScoredComment::from(c);
        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["score"], 1);
        assert_eq!(json["creator"], "alice");
    }
}
