//! In-memory comment store

use super::{logged, CommentStore, CommentTable, Persisted, SwapOutcome};
use crate::comment::{Comment, CommentValidator, NewComment};
use crate::config::{CommentConfig, StoreConfig};
use crate::error::Result;
use crate::types::{CommentId, PostId};

/// Comment store kept entirely in process memory
pub struct MemoryStore {
    table: CommentTable,
    vote_retries: usize,
}

impl MemoryStore {
    /// Create a store with default settings
    pub fn new() -> Self {
        Self::with_config(&StoreConfig::default(), &CommentConfig::default())
    }

    /// Create a store from configuration
    pub fn with_config(store: &StoreConfig, comment: &CommentConfig) -> Self {
        Self {
            table: CommentTable::new(
                store.deadline(),
                CommentValidator::with_max_length(comment.max_body_length),
            ),
            vote_retries: store.vote_retries,
        }
    }

    /// Seed the store with existing records, bypassing insert validation
    pub fn from_records(records: impl IntoIterator<Item = Comment>) -> Result<Self> {
        let store = Self::new();
        store.table.restore(records)?;
        Ok(store)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentStore for MemoryStore {
    fn insert(&self, comment: NewComment) -> Result<Comment> {
        logged("insert", self.table.insert_with(comment, |_| Ok(())))
    }

    fn get(&self, id: &CommentId) -> Result<Comment> {
        logged("get", self.table.get(id))
    }

    fn find_by_parent(&self, parent: &CommentId) -> Result<Vec<Comment>> {
        logged("find_by_parent", self.table.find_by_parent(parent))
    }

    fn find_by_post(&self, post: &PostId) -> Result<Vec<Comment>> {
        logged("find_by_post", self.table.find_by_post(post))
    }

    fn find_by_creator(&self, creator: &str) -> Result<Vec<Comment>> {
        logged("find_by_creator", self.table.find_by_creator(creator))
    }

    fn find_top_level_by_post(&self, post: &PostId) -> Result<Vec<Comment>> {
        logged("find_top_level_by_post", self.table.find_top_level_by_post(post))
    }

    fn count_by_post(&self, post: &PostId) -> Result<usize> {
        logged("count_by_post", self.table.count_by_post(post))
    }

    fn remove(&self, id: &CommentId) -> Result<Comment> {
        logged("remove", self.table.remove_with(id, |_| Ok(())))
    }

    fn compare_and_swap(&self, comment: Comment) -> Result<SwapOutcome> {
        logged(
            "compare_and_swap",
            self.table
                .compare_and_swap_with(comment, |_| Ok(Persisted::Written)),
        )
    }

    fn vote_retries(&self) -> usize {
        self.vote_retries
    }
}
