//! Comment module
//!
//! Comment records, indexing, validation, vote tallies and tree assembly.

pub mod model;
pub mod index;
pub mod validator;
pub mod builder;
pub mod tally;
pub mod tree;

pub use model::*;
pub use index::CommentIndex;
pub use validator::CommentValidator;
pub use builder::CommentBuilder;
pub use tally::{ScoredComment, VoteState, VoteTally};
pub use tree::{
    CommentForest, CommentNode, ConsistencyWarning, OrphanReason, OrphanedComment, TreeBuilder,
};
