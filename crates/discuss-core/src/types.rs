//! Core type definitions for discuss

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub Uuid);

impl CommentId {
    /// Generate a new CommentId
    pub fn new() -> Self {
        CommentId(Uuid::new_v4())
    }

    /// Create from UUID string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(CommentId(Uuid::parse_str(s)?))
    }
}

impl Default for CommentId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for CommentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of the post a comment belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl PostId {
    /// Create from a string with validation
    pub fn from_string(s: impl Into<String>) -> crate::Result<Self> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(crate::DiscussError::Validation(
                "Post ID cannot be empty".to_string(),
            ));
        }
        Ok(PostId(s))
    }

    /// Get the string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Protocol version for compatibility of persisted documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub major: u32,
    pub minor: u32,
}

impl ProtocolVersion {
    pub const V1_0: Self = Self { major: 1, minor: 0 };

    /// Check if this version is compatible with another version
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.major == other.major
    }

    /// Parse "major.minor"
    pub fn parse(s: &str) -> Option<Self> {
        let (major, minor) = s.split_once('.')?;
        Some(Self {
            major: major.parse().ok()?,
            minor: minor.parse().ok()?,
        })
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::V1_0
    }
}
