//! Comment validation

use super::model::NewComment;
use crate::error::{DiscussError, Result};

/// Maximum body length (default)
pub const MAX_BODY_LENGTH: usize = 10000;

/// Minimum body length
pub const MIN_BODY_LENGTH: usize = 1;

/// Validator for insert requests
#[derive(Debug, Clone)]
pub struct CommentValidator {
    max_length: usize,
    min_length: usize,
}

impl CommentValidator {
    /// Create a new validator with default settings
    pub fn new() -> Self {
        Self {
            max_length: MAX_BODY_LENGTH,
            min_length: MIN_BODY_LENGTH,
        }
    }

    /// Create a new validator with custom max length
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            min_length: MIN_BODY_LENGTH,
        }
    }

    /// Validate comment body
    pub fn validate_body(&self, body: &str) -> Result<()> {
        let trimmed = body.trim();

        if trimmed.chars().count() < self.min_length {
            return Err(DiscussError::Validation(
                "Comment body cannot be empty".to_string(),
            ));
        }

        if trimmed.chars().count() > self.max_length {
            return Err(DiscussError::Validation(format!(
                "Comment body exceeds maximum length of {} characters",
                self.max_length
            )));
        }

        Ok(())
    }

    /// Validate an identity string (creator, voter, reporter)
    pub fn validate_identity(&self, identity: &str) -> Result<()> {
        if identity.trim().is_empty() {
            return Err(DiscussError::Validation(
                "Identity cannot be empty".to_string(),
            ));
        }
        if identity.chars().any(char::is_control) {
            return Err(DiscussError::Validation(format!(
                "Identity contains control characters: {:?}",
                identity
            )));
        }
        Ok(())
    }

    /// Validate the fields of an insert request that need no store lookup
    pub fn validate(&self, comment: &NewComment) -> Result<()> {
        self.validate_identity(&comment.creator)?;
        self.validate_body(&comment.body)?;

        if comment.post.as_str().trim().is_empty() {
            return Err(DiscussError::Validation(
                "Post ID cannot be empty".to_string(),
            ));
        }

        if let (Some(id), Some(parent)) = (comment.id, comment.parent) {
            if id == parent {
                return Err(DiscussError::Validation(format!(
                    "Comment {} cannot be its own parent",
                    id
                )));
            }
        }

        Ok(())
    }
}

impl Default for CommentValidator {
    fn default() -> Self {
        Self::new()
    }
}
