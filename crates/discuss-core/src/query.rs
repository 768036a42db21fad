//! Read-side query entry points
//!
//! Each method maps onto one named entry point of the external API layer
//! (`findManyByParentID`, `findManyByPostID`, `findManyByCreator`,
//! `findTopLevelByPostID`). Failures are logged and wrapped in
//! [`QueryError`]; an empty result is always `Ok(vec![])`.

use crate::comment::{CommentForest, ScoredComment, TreeBuilder, VoteState, VoteTally};
use crate::error::{QueryError, QueryResult, Result};
use crate::store::CommentStore;
use crate::types::{CommentId, PostId};
use std::sync::Arc;
use tracing::error;

pub const FIND_MANY_BY_PARENT_ID: &str = "findManyByParentID";
pub const FIND_MANY_BY_POST_ID: &str = "findManyByPostID";
pub const FIND_MANY_BY_CREATOR: &str = "findManyByCreator";
pub const FIND_TOP_LEVEL_BY_POST_ID: &str = "findTopLevelByPostID";
pub const FIND_TREE_BY_POST_ID: &str = "findTreeByPostID";
pub const VOTE_STATE: &str = "voteState";

/// Query service over a comment store
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn CommentStore>,
}

impl QueryService {
    /// Create a service owning the given store
    pub fn new(store: impl CommentStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Create a service over a shared store
    pub fn with_store(store: Arc<dyn CommentStore>) -> Self {
        Self { store }
    }

    /// Get access to the underlying store (writes go through here)
    pub fn store(&self) -> &dyn CommentStore {
        self.store.as_ref()
    }

    fn run<T>(&self, operation: &'static str, result: Result<T>) -> QueryResult<T> {
        result.map_err(|source| {
            error!(operation, error = %source, "Comment query failed");
            QueryError::new(operation, source)
        })
    }

    /// Direct replies to a comment, scored
    pub fn find_many_by_parent_id(
        &self,
        parent: &CommentId,
    ) -> QueryResult<Vec<ScoredComment>> {
        let comments = self.run(FIND_MANY_BY_PARENT_ID, self.store.find_by_parent(parent))?;
        Ok(comments.into_iter().map(ScoredComment::from).collect())
    }

    /// Every comment on a post, scored
    pub fn find_many_by_post_id(
        &self,
        post: &PostId,
    ) -> QueryResult<Vec<ScoredComment>> {
        let comments = self.run(FIND_MANY_BY_POST_ID, self.store.find_by_post(post))?;
        Ok(comments.into_iter().map(ScoredComment::from).collect())
    }

    /// Every comment by a creator, scored
    pub fn find_many_by_creator(
        &self,
        creator: &str,
    ) -> QueryResult<Vec<ScoredComment>> {
        let comments = self.run(FIND_MANY_BY_CREATOR, self.store.find_by_creator(creator))?;
        Ok(comments.into_iter().map(ScoredComment::from).collect())
    }

    /// Top-level comments of a post, scored. Replies are available through
    /// [`find_many_by_parent_id`](Self::find_many_by_parent_id) or
    /// [`find_tree_by_post_id`](Self::find_tree_by_post_id).
    pub fn find_top_level_by_post_id(
        &self,
        post: &PostId,
    ) -> QueryResult<Vec<ScoredComment>> {
        let comments = self.run(
            FIND_TOP_LEVEL_BY_POST_ID,
            self.store.find_top_level_by_post(post),
        )?;
        Ok(comments.into_iter().map(ScoredComment::from).collect())
    }

    /// Full nested discussion of a post, built from one snapshot
    pub fn find_tree_by_post_id(
        &self,
        post: &PostId,
    ) -> QueryResult<CommentForest> {
        let snapshot = self.run(FIND_TREE_BY_POST_ID, self.store.find_by_post(post))?;
        Ok(TreeBuilder::new(post.clone()).build(snapshot))
    }

    /// How `identity` voted on a comment
    pub fn vote_state(
        &self,
        id: &CommentId,
        identity: &str,
    ) -> QueryResult<VoteState> {
        let comment = self.run(VOTE_STATE, self.store.get(id))?;
        Ok(VoteTally::vote_state(&comment, identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::{Comment, CommentBuilder, NewComment};
    use crate::error::DiscussError;
    use crate::store::{MemoryStore, SwapOutcome};
    use pretty_assertions::assert_eq;

    /// Store whose backend is permanently unreachable
    struct DownStore;

    fn down<T>() -> Result<T> {
        Err(DiscussError::Storage("connection refused".to_string()))
    }

    impl CommentStore for DownStore {
        fn insert(&self, _: NewComment) -> Result<Comment> {
            down()
        }
        fn get(&self, _: &CommentId) -> Result<Comment> {
            down()
        }
        fn find_by_parent(&self, _: &CommentId) -> Result<Vec<Comment>> {
            down()
        }
        fn find_by_post(&self, _: &PostId) -> Result<Vec<Comment>> {
            down()
        }
        fn find_by_creator(&self, _: &str) -> Result<Vec<Comment>> {
            down()
        }
        fn find_top_level_by_post(&self, _: &PostId) -> Result<Vec<Comment>> {
            down()
        }
        fn remove(&self, _: &CommentId) -> Result<Comment> {
            down()
        }
        fn compare_and_swap(&self, _: Comment) -> Result<SwapOutcome> {
            down()
        }
    }

    fn post(id: &str) -> PostId {
        PostId(id.to_string())
    }

    fn scenario() -> (QueryService, Comment, Comment, Comment) {
        let service = QueryService::new(MemoryStore::new());
        let store = service.store();
        let r = store
            .insert(CommentBuilder::new(post("P1")).creator("alice").body("R").build().unwrap())
            .unwrap();
        let a = store
            .insert(CommentBuilder::reply(post("P1"), r.id).creator("bob").body("A").build().unwrap())
            .unwrap();
        let b = store
            .insert(CommentBuilder::reply(post("P1"), a.id).creator("carol").body("B").build().unwrap())
            .unwrap();
        (service, r, a, b)
    }

    #[test]
    fn test_root_child_grandchild_scenario() {
        let (service, r, a, b) = scenario();
        assert_eq!((r.depth, a.depth, b.depth), (0, 1, 2));

        let replies = service.find_many_by_parent_id(&r.id).unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].comment.id, a.id);

        let top = service.find_top_level_by_post_id(&post("P1")).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].comment.id, r.id);

        let forest = service.find_tree_by_post_id(&post("P1")).unwrap();
        assert_eq!(forest.roots.len(), 1);
        let root = &forest.roots[0];
        assert_eq!(root.id(), r.id);
        assert_eq!(root.children[0].id(), a.id);
        assert_eq!(root.children[0].children[0].id(), b.id);
        assert!(root.children[0].children[0].children.is_empty());
    }

    #[test]
    fn test_results_are_scored() {
        let (service, r, _, _) = scenario();
        service.store().add_downvote(&r.id, "x").unwrap();
        service.store().add_downvote(&r.id, "y").unwrap();
        service.store().add_upvote(&r.id, "z").unwrap();

        let all = service.find_many_by_post_id(&post("P1")).unwrap();
        assert_eq!(all.len(), 3);
        let root = all.iter().find(|s| s.comment.id == r.id).unwrap();
        assert_eq!(root.score, -1);
        assert!(all.iter().filter(|s| s.comment.id != r.id).all(|s| s.score == 0));

        let mine = service.find_many_by_creator("alice").unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].score, -1);
    }

    #[test]
    fn test_empty_results_are_ok() {
        let service = QueryService::new(MemoryStore::new());
        assert!(service.find_many_by_post_id(&post("none")).unwrap().is_empty());
        assert!(service.find_many_by_creator("nobody").unwrap().is_empty());
        assert!(service.find_many_by_parent_id(&CommentId::new()).unwrap().is_empty());
        assert!(service.find_tree_by_post_id(&post("none")).unwrap().is_empty());
    }

    #[test]
    fn test_storage_failure_is_typed() {
        let service = QueryService::new(DownStore);

        let err = service.find_many_by_post_id(&post("P1")).unwrap_err();
        assert_eq!(err.operation, FIND_MANY_BY_POST_ID);
        assert!(err.source.is_storage());
        assert_eq!(
            err.to_string(),
            "Comment findManyByPostID failed: Storage error: connection refused"
        );

        assert_eq!(
            service.find_many_by_parent_id(&CommentId::new()).unwrap_err().operation,
            FIND_MANY_BY_PARENT_ID
        );
        assert_eq!(
            service.find_many_by_creator("a").unwrap_err().operation,
            FIND_MANY_BY_CREATOR
        );
        assert_eq!(
            service.find_top_level_by_post_id(&post("P1")).unwrap_err().operation,
            FIND_TOP_LEVEL_BY_POST_ID
        );
        assert_eq!(
            service.find_tree_by_post_id(&post("P1")).unwrap_err().operation,
            FIND_TREE_BY_POST_ID
        );
    }

    #[test]
    fn test_vote_state() {
        let (service, r, _, _) = scenario();
        service.store().add_upvote(&r.id, "dave").unwrap();

        assert_eq!(service.vote_state(&r.id, "dave").unwrap(), VoteState::Upvoted);
        assert_eq!(service.vote_state(&r.id, "erin").unwrap(), VoteState::None);
        assert!(service
            .vote_state(&CommentId::new(), "dave")
            .unwrap_err()
            .source
            .is_not_found());
    }
}
