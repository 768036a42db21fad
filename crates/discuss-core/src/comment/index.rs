//! Comment indexing for fast lookup

use super::model::Comment;
use crate::types::{CommentId, PostId};
use std::collections::HashMap;

/// Secondary indexes over the immutable fields of stored comments
#[derive(Debug, Clone, Default)]
pub struct CommentIndex {
    /// Index by parent comment
    by_parent: HashMap<CommentId, Vec<CommentId>>,
    /// Index by post
    by_post: HashMap<PostId, Vec<CommentId>>,
    /// Index by creator
    by_creator: HashMap<String, Vec<CommentId>>,
    /// Parent-less comments by post
    top_level: HashMap<PostId, Vec<CommentId>>,
}

fn unlink<K>(map: &mut HashMap<K, Vec<CommentId>>, key: &K, id: &CommentId)
where
    K: std::hash::Hash + Eq,
{
    if let Some(ids) = map.get_mut(key) {
        ids.retain(|i| i != id);
        if ids.is_empty() {
            map.remove(key);
        }
    }
}

impl CommentIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a comment to the index
    pub fn add(&mut self, comment: &Comment) {
        match comment.parent {
            Some(parent) => self.by_parent.entry(parent).or_default().push(comment.id),
            None => self
                .top_level
                .entry(comment.post.clone())
                .or_default()
                .push(comment.id),
        }

        self.by_post
            .entry(comment.post.clone())
            .or_default()
            .push(comment.id);

        self.by_creator
            .entry(comment.creator.clone())
            .or_default()
            .push(comment.id);
    }

    /// Remove a comment from the index
    pub fn remove(&mut self, comment: &Comment) {
        match &comment.parent {
            Some(parent) => unlink(&mut self.by_parent, parent, &comment.id),
            None => unlink(&mut self.top_level, &comment.post, &comment.id),
        }
        unlink(&mut self.by_post, &comment.post, &comment.id);
        unlink(&mut self.by_creator, &comment.creator, &comment.id);
    }

    /// Get direct replies to a comment
    pub fn get_by_parent(&self, parent: &CommentId) -> &[CommentId] {
        self.by_parent.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get comments by post
    pub fn get_by_post(&self, post: &PostId) -> &[CommentId] {
        self.by_post.get(post).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get comments by creator
    pub fn get_by_creator(&self, creator: &str) -> &[CommentId] {
        self.by_creator.get(creator).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get parent-less comments of a post
    pub fn get_top_level(&self, post: &PostId) -> &[CommentId] {
        self.top_level.get(post).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get comment count for a post
    pub fn post_comment_count(&self, post: &PostId) -> usize {
        self.by_post.get(post).map(|ids| ids.len()).unwrap_or(0)
    }
}
