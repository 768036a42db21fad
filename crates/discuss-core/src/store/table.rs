//! In-process comment table shared by the store backends
//!
//! Records live in an arena keyed by id, each behind its own mutex. The map
//! and the secondary index sit behind one `RwLock` that is only written by
//! inserts and removals; vote updates take it shared and lock just the
//! target record. Every acquisition is bounded by the store deadline.

use super::{Persisted, SwapOutcome};
use crate::comment::{Comment, CommentIndex, CommentValidator, NewComment};
use crate::error::{DiscussError, Result};
use crate::types::{CommentId, PostId};
use chrono::Utc;
use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Default)]
struct TableInner {
    records: HashMap<CommentId, Arc<Mutex<Comment>>>,
    index: CommentIndex,
}

/// Indexed, lock-per-record comment table
pub struct CommentTable {
    inner: RwLock<TableInner>,
    deadline: Duration,
    validator: CommentValidator,
}

/// Sort by creation date, ties broken by id
pub fn sort_by_age(comments: &mut [Comment]) {
    comments.sort_by(|a, b| {
        a.date_created
            .cmp(&b.date_created)
            .then_with(|| a.id.cmp(&b.id))
    });
}

impl CommentTable {
    pub fn new(deadline: Duration, validator: CommentValidator) -> Self {
        Self {
            inner: RwLock::new(TableInner::default()),
            deadline,
            validator,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn validator(&self) -> &CommentValidator {
        &self.validator
    }

    fn timeout(&self, operation: &'static str) -> DiscussError {
        DiscussError::Timeout {
            operation,
            deadline: self.deadline,
        }
    }

    fn read(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, TableInner>> {
        self.inner
            .try_read_for(self.deadline)
            .ok_or_else(|| self.timeout(operation))
    }

    fn write(&self, operation: &'static str) -> Result<RwLockWriteGuard<'_, TableInner>> {
        self.inner
            .try_write_for(self.deadline)
            .ok_or_else(|| self.timeout(operation))
    }

    fn lock<'a>(
        &self,
        record: &'a Mutex<Comment>,
        operation: &'static str,
    ) -> Result<MutexGuard<'a, Comment>> {
        record
            .try_lock_for(self.deadline)
            .ok_or_else(|| self.timeout(operation))
    }

    /// Validate and insert, calling `persist` before the record becomes visible.
    ///
    /// A `persist` failure leaves the table unchanged.
    pub fn insert_with<F>(&self, new: NewComment, persist: F) -> Result<Comment>
    where
        F: FnOnce(&Comment) -> Result<()>,
    {
        const OP: &str = "insert";
        self.validator.validate(&new)?;

        let mut inner = self.write(OP)?;
        let id = new.id.unwrap_or_else(CommentId::new);
        if inner.records.contains_key(&id) {
            return Err(DiscussError::Validation(format!(
                "Comment with ID {} already exists",
                id
            )));
        }

        let depth = match new.parent {
            None => 0,
            Some(parent_id) => {
                let record = inner.records.get(&parent_id).ok_or_else(|| {
                    DiscussError::NotFound(format!("parent comment {}", parent_id))
                })?;
                let parent = self.lock(record, OP)?.clone();
                if parent.post != new.post {
                    return Err(DiscussError::Validation(format!(
                        "Parent comment {} belongs to post {}, not {}",
                        parent_id, parent.post, new.post
                    )));
                }
                self.check_ancestry(&inner, id, &parent)?;
                parent.depth + 1
            }
        };

        let comment = new.into_comment(id, depth, Utc::now());
        persist(&comment)?;

        inner.index.add(&comment);
        inner
            .records
            .insert(id, Arc::new(Mutex::new(comment.clone())));
        debug!("Inserted comment {} on post {} at depth {}", id, comment.post, depth);
        Ok(comment)
    }

    /// Walk the parent chain upward, rejecting a chain that reaches `id` or loops
    fn check_ancestry(&self, inner: &TableInner, id: CommentId, parent: &Comment) -> Result<()> {
        let mut seen = HashSet::new();
        let mut cursor = Some(parent.id);
        while let Some(current) = cursor {
            if current == id {
                return Err(DiscussError::Validation(format!(
                    "Comment {} would be its own ancestor",
                    id
                )));
            }
            if !seen.insert(current) {
                return Err(DiscussError::Validation(format!(
                    "Parent chain of comment {} loops at {}",
                    parent.id, current
                )));
            }
            cursor = match inner.records.get(&current) {
                Some(record) => self.lock(record, "insert")?.parent,
                // Ancestor removed by moderation; the chain ends here.
                None => None,
            };
        }
        Ok(())
    }

    /// Load persisted records without validation, skipping duplicate ids
    pub fn restore(&self, comments: impl IntoIterator<Item = Comment>) -> Result<usize> {
        let mut inner = self.write("restore")?;
        let mut loaded = 0;
        for comment in comments {
            if inner.records.contains_key(&comment.id) {
                warn!("Skipping duplicate comment record {}", comment.id);
                continue;
            }
            inner.index.add(&comment);
            inner
                .records
                .insert(comment.id, Arc::new(Mutex::new(comment)));
            loaded += 1;
        }
        Ok(loaded)
    }

    pub fn get(&self, id: &CommentId) -> Result<Comment> {
        const OP: &str = "get";
        let inner = self.read(OP)?;
        let record = inner
            .records
            .get(id)
            .ok_or_else(|| DiscussError::NotFound(format!("comment {}", id)))?;
        let comment = self.lock(record, OP)?.clone();
        Ok(comment)
    }

    fn collect<S>(&self, operation: &'static str, select: S) -> Result<Vec<Comment>>
    where
        S: FnOnce(&CommentIndex) -> &[CommentId],
    {
        let inner = self.read(operation)?;
        let ids = select(&inner.index);
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = inner.records.get(id) {
                out.push(self.lock(record, operation)?.clone());
            }
        }
        sort_by_age(&mut out);
        Ok(out)
    }

    pub fn find_by_parent(&self, parent: &CommentId) -> Result<Vec<Comment>> {
        self.collect("find_by_parent", |index| index.get_by_parent(parent))
    }

    pub fn find_by_post(&self, post: &PostId) -> Result<Vec<Comment>> {
        self.collect("find_by_post", |index| index.get_by_post(post))
    }

    pub fn find_by_creator(&self, creator: &str) -> Result<Vec<Comment>> {
        self.collect("find_by_creator", |index| index.get_by_creator(creator))
    }

    pub fn find_top_level_by_post(&self, post: &PostId) -> Result<Vec<Comment>> {
        self.collect("find_top_level_by_post", |index| index.get_top_level(post))
    }

    pub fn count_by_post(&self, post: &PostId) -> Result<usize> {
        Ok(self.read("count_by_post")?.index.post_comment_count(post))
    }

    /// Total number of records
    pub fn len(&self) -> Result<usize> {
        Ok(self.read("len")?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove a record, calling `persist` before it disappears
    pub fn remove_with<F>(&self, id: &CommentId, persist: F) -> Result<Comment>
    where
        F: FnOnce(&Comment) -> Result<()>,
    {
        const OP: &str = "remove";
        let mut inner = self.write(OP)?;
        let record = inner
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| DiscussError::NotFound(format!("comment {}", id)))?;
        let comment = self.lock(&record, OP)?.clone();
        persist(&comment)?;

        inner.records.remove(id);
        inner.index.remove(&comment);
        debug!("Removed comment {}", id);
        Ok(comment)
    }

    /// Replace a record if its revision still matches `candidate.revision`.
    ///
    /// `persist` sees the record with its bumped revision. When it reports
    /// [`Persisted::Stale`] the backing copy replaces the cached one and the
    /// swap ends in a conflict.
    pub fn compare_and_swap_with<F>(&self, candidate: Comment, persist: F) -> Result<SwapOutcome>
    where
        F: FnOnce(&Comment) -> Result<Persisted>,
    {
        const OP: &str = "compare_and_swap";
        let inner = self.read(OP)?;
        let record = inner
            .records
            .get(&candidate.id)
            .ok_or_else(|| DiscussError::NotFound(format!("comment {}", candidate.id)))?;
        let mut current = self.lock(record, OP)?;

        if current.revision != candidate.revision {
            return Ok(SwapOutcome::Conflict(current.clone()));
        }
        if !current.same_identity(&candidate) {
            return Err(DiscussError::Validation(format!(
                "Only votes and reports of comment {} can change",
                candidate.id
            )));
        }

        let mut next = candidate;
        next.revision = current.revision + 1;
        match persist(&next)? {
            Persisted::Written => {
                *current = next.clone();
                Ok(SwapOutcome::Applied(next))
            }
            Persisted::Stale(fresh) => {
                if !current.same_identity(&fresh) {
                    return Err(DiscussError::Storage(format!(
                        "Stored copy of comment {} no longer matches its identity",
                        fresh.id
                    )));
                }
                debug!(
                    "Comment {} moved from revision {} to {} behind this handle",
                    fresh.id, current.revision, fresh.revision
                );
                *current = fresh.clone();
                Ok(SwapOutcome::Conflict(fresh))
            }
        }
    }
}
