//! discuss-storage - Storage library for discuss
//!
//! This crate provides the file system backed comment store.

mod comment_store;
pub mod document;
mod lock;

pub use comment_store::FileSystemStore;
