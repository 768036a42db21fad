//! discuss-core - Core library for discuss
//!
//! This crate provides the threaded-comment engine: the comment data model,
//! the storage seam with its in-memory backend, vote tallies, tree assembly
//! and the query entry points.

pub mod error;
pub mod types;
pub mod config;
pub mod comment;
pub mod store;
pub mod query;

pub use error::{DiscussError, QueryError, QueryResult, Result};
pub use query::QueryService;
pub use types::*;
