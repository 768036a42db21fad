//! Comment builder for fluent API

use super::model::NewComment;
use crate::error::{DiscussError, Result};
use crate::types::{CommentId, PostId};
use chrono::{DateTime, Utc};

/// Builder for insert requests
pub struct CommentBuilder {
    post: PostId,
    creator: Option<String>,
    body: Option<String>,
    parent: Option<CommentId>,
    id: Option<CommentId>,
    date_created: Option<DateTime<Utc>>,
}

impl CommentBuilder {
    /// Create a new builder for a comment on `post`
    pub fn new(post: PostId) -> Self {
        Self {
            post,
            creator: None,
            body: None,
            parent: None,
            id: None,
            date_created: None,
        }
    }

    /// Start a reply to `parent` on the same post
    pub fn reply(post: PostId, parent: CommentId) -> Self {
        Self::new(post).parent(parent)
    }

    /// Set the author identity
    pub fn creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    /// Set the comment text
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the parent comment
    pub fn parent(mut self, parent: CommentId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Pin the id instead of letting the store generate one
    pub fn id(mut self, id: CommentId) -> Self {
        self.id = Some(id);
        self
    }

    /// Backdate the comment (imports)
    pub fn date_created(mut self, date: DateTime<Utc>) -> Self {
        self.date_created = Some(date);
        self
    }

    /// Build the insert request
    pub fn build(self) -> Result<NewComment> {
        let creator = self.creator.ok_or_else(|| {
            DiscussError::Validation("Comment creator is required".to_string())
        })?;
        let body = self
            .body
            .ok_or_else(|| DiscussError::Validation("Comment body is required".to_string()))?;

        if creator.trim().is_empty() {
            return Err(DiscussError::Validation(
                "Comment creator cannot be empty".to_string(),
            ));
        }
        if body.trim().is_empty() {
            return Err(DiscussError::Validation(
                "Comment body cannot be empty".to_string(),
            ));
        }

        Ok(NewComment {
            id: self.id,
            creator,
            post: self.post,
            parent: self.parent,
            body,
            date_created: self.date_created,
        })
    }
}
