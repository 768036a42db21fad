//! Comment storage
//!
//! `CommentStore` is the persistence seam: keyed storage of comment records
//! with lookup by parent, post and creator, plus an atomic per-record
//! compare-and-swap that the vote operations build on.
//!
//! # Example
//!
//! ```
//! use discuss_core::comment::CommentBuilder;
//! use discuss_core::store::{CommentStore, MemoryStore};
//! use discuss_core::types::PostId;
//!
//! let store = MemoryStore::new();
//! let post = PostId::from_string("post-1").unwrap();
//! let root = store
//!     .insert(CommentBuilder::new(post.clone()).creator("alice").body("hi").build().unwrap())
//!     .unwrap();
//! let reply = store
//!     .insert(CommentBuilder::reply(post, root.id).creator("bob").body("hello").build().unwrap())
//!     .unwrap();
//! assert_eq!(reply.depth, 1);
//! ```

mod memory;
mod table;

pub use memory::MemoryStore;
pub use table::{sort_by_age, CommentTable};

use crate::comment::{Comment, CommentValidator, NewComment, VoteAction};
use crate::error::{DiscussError, Result};
use crate::types::{CommentId, PostId};
use tracing::{debug, error, warn};

/// Default compare-and-swap attempts per vote
pub const DEFAULT_VOTE_RETRIES: usize = 16;

/// Result of a compare-and-swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Stored with the bumped revision
    Applied(Comment),
    /// Revision moved on; carries the current record
    Conflict(Comment),
}

/// What a backend found while writing a swapped record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persisted {
    /// The record was written
    Written,
    /// The backing copy moved on since this handle loaded it; carries that copy
    Stale(Comment),
}

/// Report a store failure to the log before handing it back
pub fn logged<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    result.map_err(|e| {
        if e.is_storage() {
            error!(operation, error = %e, "Comment store operation failed");
        } else {
            warn!(operation, error = %e, "Comment store operation rejected");
        }
        e
    })
}

/// Trait for comment storage implementations
pub trait CommentStore: Send + Sync {
    /// Insert a comment, assigning its id and deriving its depth
    fn insert(&self, comment: NewComment) -> Result<Comment>;

    /// Get a comment by id
    fn get(&self, id: &CommentId) -> Result<Comment>;

    /// Direct replies to `parent`, oldest first
    fn find_by_parent(&self, parent: &CommentId) -> Result<Vec<Comment>>;

    /// All comments of a post, oldest first
    fn find_by_post(&self, post: &PostId) -> Result<Vec<Comment>>;

    /// All comments by a creator, oldest first
    fn find_by_creator(&self, creator: &str) -> Result<Vec<Comment>>;

    /// Comments of a post without a parent, oldest first
    fn find_top_level_by_post(&self, post: &PostId) -> Result<Vec<Comment>>;

    /// Number of comments on a post
    fn count_by_post(&self, post: &PostId) -> Result<usize> {
        Ok(self.find_by_post(post)?.len())
    }

    /// Delete a comment (moderation). Replies stay in the store.
    fn remove(&self, id: &CommentId) -> Result<Comment>;

    /// Store `comment` if the stored revision equals `comment.revision`
    fn compare_and_swap(&self, comment: Comment) -> Result<SwapOutcome>;

    /// Compare-and-swap attempts per vote
    fn vote_retries(&self) -> usize {
        DEFAULT_VOTE_RETRIES
    }

    /// Apply a vote or report change with an optimistic retry loop.
    ///
    /// A change that leaves the record as it is returns the current record
    /// without writing.
    fn apply_vote(&self, id: &CommentId, action: VoteAction, identity: &str) -> Result<Comment> {
        // Voters and reporters follow the same rule as creators
        if let Err(e) = CommentValidator::new().validate_identity(identity) {
            return logged("apply_vote", Err(e));
        }

        let retries = self.vote_retries();
        for attempt in 1..=retries {
            let current = self.get(id)?;
            let mut next = current.clone();
            if !action.apply(&mut next, identity) {
                return Ok(current);
            }
            match self.compare_and_swap(next)? {
                SwapOutcome::Applied(comment) => return Ok(comment),
                SwapOutcome::Conflict(_) => {
                    debug!("{} on comment {} conflicted (attempt {})", action, id, attempt);
                }
            }
        }

        logged(
            "apply_vote",
            Err(DiscussError::Storage(format!(
                "{} on comment {} still conflicting after {} attempts",
                action, id, retries
            ))),
        )
    }

    fn add_upvote(&self, id: &CommentId, identity: &str) -> Result<Comment> {
        self.apply_vote(id, VoteAction::Upvote, identity)
    }

    fn add_downvote(&self, id: &CommentId, identity: &str) -> Result<Comment> {
        self.apply_vote(id, VoteAction::Downvote, identity)
    }

    fn remove_vote(&self, id: &CommentId, identity: &str) -> Result<Comment> {
        self.apply_vote(id, VoteAction::ClearVote, identity)
    }

    fn add_report(&self, id: &CommentId, identity: &str) -> Result<Comment> {
        self.apply_vote(id, VoteAction::Report, identity)
    }

    fn remove_report(&self, id: &CommentId, identity: &str) -> Result<Comment> {
        self.apply_vote(id, VoteAction::WithdrawReport, identity)
    }
}
