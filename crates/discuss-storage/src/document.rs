//! On-disk comment document format

use chrono::{DateTime, Utc};
use discuss_core::comment::Comment;
use discuss_core::error::{DiscussError, Result};
use discuss_core::types::ProtocolVersion;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: &str = "1.0";

/// A single comment as written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentDocument {
    /// Schema version for compatibility checks
    pub schema_version: String,
    /// When this revision was written
    pub saved_at: DateTime<Utc>,
    /// The comment record
    pub comment: Comment,
    /// Extra fields for forward compatibility
    #[serde(flatten, default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl CommentDocument {
    /// Wrap a comment with the current schema version
    pub fn new(comment: Comment) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION.to_string(),
            saved_at: Utc::now(),
            comment,
            extra: HashMap::new(),
        }
    }

    /// Get the comment, consuming the document
    pub fn into_comment(self) -> Comment {
        self.comment
    }

    /// Reject documents written by an incompatible major version
    pub fn check_version(&self) -> Result<()> {
        let version = ProtocolVersion::parse(&self.schema_version).ok_or_else(|| {
            DiscussError::Validation(format!(
                "Invalid schema version format: {}",
                self.schema_version
            ))
        })?;
        let current = ProtocolVersion::V1_0;
        if !version.is_compatible(&current) {
            return Err(DiscussError::Validation(format!(
                "Incompatible schema version: {} (expected {}.x)",
                self.schema_version, current.major
            )));
        }
        Ok(())
    }
}
