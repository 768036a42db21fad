//! Nested discussion trees built from flat parent pointers
//!
//! The builder works on a snapshot of a single post's comments. Records whose
//! parent chain cannot be resolved to a top-level comment of the same post are
//! excluded from the forest and reported as orphans; stored depths that
//! disagree with the parent chain are corrected and reported as warnings.
//! Neither condition aborts the build.

use super::model::Comment;
use super::tally::VoteTally;
use crate::types::{CommentId, PostId};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// Why a comment was left out of the forest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanReason {
    /// The comment belongs to another post
    ForeignPost,
    /// The parent id is not part of the snapshot
    MissingParent,
    /// The parent belongs to another post
    ForeignParent,
    /// Another record with the same id came first
    DuplicateId,
    /// The parent chain loops or runs into another orphan
    Unreachable,
}

impl std::fmt::Display for OrphanReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrphanReason::ForeignPost => "comment belongs to another post",
            OrphanReason::MissingParent => "parent not found",
            OrphanReason::ForeignParent => "parent belongs to another post",
            OrphanReason::DuplicateId => "duplicate id",
            OrphanReason::Unreachable => "not reachable from a top-level comment",
        };
        f.write_str(s)
    }
}

/// A comment excluded from the forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanedComment {
    pub id: CommentId,
    pub parent: Option<CommentId>,
    pub reason: OrphanReason,
}

/// Stored depth disagreed with the parent chain; `derived` was used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyWarning {
    pub id: CommentId,
    pub stored: u32,
    pub derived: u32,
}

/// A comment with its replies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    pub comment: Comment,
    pub score: i64,
    pub children: Vec<CommentNode>,
}

impl CommentNode {
    pub fn id(&self) -> CommentId {
        self.comment.id
    }
}

/// Result of a tree build
///
/// Serializes flat: `comments` lists every node in pre-order with the ids of
/// its children, so the JSON nesting stays constant however deep a thread is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentForest {
    pub roots: Vec<CommentNode>,
    pub orphans: Vec<OrphanedComment>,
    pub warnings: Vec<ConsistencyWarning>,
}

impl CommentForest {
    /// Number of comments placed in the forest (orphans excluded)
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Pre-order walk over every node
    pub fn iter(&self) -> ForestIter<'_> {
        ForestIter {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// Find a node anywhere in the forest
    pub fn find(&self, id: &CommentId) -> Option<&CommentNode> {
        self.iter().find(|node| node.comment.id == *id)
    }
}

/// Serialized form of a placed comment
#[derive(Serialize)]
struct FlatNode<'a> {
    #[serde(flatten)]
    comment: &'a Comment,
    score: i64,
    children: Vec<CommentId>,
}

#[derive(Serialize)]
struct ForestView<'a> {
    roots: Vec<CommentId>,
    comments: Vec<FlatNode<'a>>,
    orphans: &'a [OrphanedComment],
    warnings: &'a [ConsistencyWarning],
}

impl Serialize for CommentForest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        ForestView {
            roots: self.roots.iter().map(CommentNode::id).collect(),
            comments: self
                .iter()
                .map(|node| FlatNode {
                    comment: &node.comment,
                    score: node.score,
                    children: node.children.iter().map(CommentNode::id).collect(),
                })
                .collect(),
            orphans: &self.orphans,
            warnings: &self.warnings,
        }
        .serialize(serializer)
    }
}

impl Drop for CommentForest {
    // Unlink level by level so long chains do not recurse in drop glue
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.roots);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// Pre-order iterator over a forest
pub struct ForestIter<'a> {
    stack: Vec<&'a CommentNode>,
}

impl<'a> Iterator for ForestIter<'a> {
    type Item = &'a CommentNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Assembles the comments of one post into a forest
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    post: PostId,
}

impl TreeBuilder {
    pub fn new(post: PostId) -> Self {
        Self { post }
    }

    /// Build the forest from a snapshot.
    ///
    /// Runs in O(n log n) for the sibling sort, O(n) otherwise, without
    /// recursion. Every input record ends up either in the forest or in
    /// `orphans`.
    pub fn build(&self, comments: Vec<Comment>) -> CommentForest {
        let mut orphans = Vec::new();
        let mut slots: Vec<Comment> = Vec::with_capacity(comments.len());
        let mut slot_of: HashMap<CommentId, usize> = HashMap::with_capacity(comments.len());
        let mut foreign: HashSet<CommentId> = HashSet::new();

        for comment in comments {
            if comment.post != self.post {
                foreign.insert(comment.id);
                orphans.push(orphan(&comment, OrphanReason::ForeignPost));
            } else if slot_of.contains_key(&comment.id) {
                orphans.push(orphan(&comment, OrphanReason::DuplicateId));
            } else {
                slot_of.insert(comment.id, slots.len());
                slots.push(comment);
            }
        }

        let n = slots.len();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut roots = Vec::new();
        let mut excluded = vec![false; n];

        for (i, comment) in slots.iter().enumerate() {
            match comment.parent {
                None => roots.push(i),
                Some(parent) => match slot_of.get(&parent) {
                    Some(&p) => children[p].push(i),
                    None => {
                        let reason = if foreign.contains(&parent) {
                            OrphanReason::ForeignParent
                        } else {
                            OrphanReason::MissingParent
                        };
                        excluded[i] = true;
                        orphans.push(orphan(comment, reason));
                    }
                },
            }
        }

        let by_age = |a: &usize, b: &usize| {
            let (a, b) = (&slots[*a], &slots[*b]);
            a.date_created.cmp(&b.date_created).then(a.id.cmp(&b.id))
        };
        roots.sort_by(by_age);
        for siblings in children.iter_mut() {
            siblings.sort_by(by_age);
        }

        // Breadth-first from the roots; siblings stay contiguous in `order`.
        let mut depth = vec![0u32; n];
        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let mut queue: VecDeque<usize> = roots.iter().copied().collect();
        for &r in &roots {
            visited[r] = true;
        }
        let mut warnings = Vec::new();
        while let Some(i) = queue.pop_front() {
            order.push(i);
            if slots[i].depth != depth[i] {
                warnings.push(ConsistencyWarning {
                    id: slots[i].id,
                    stored: slots[i].depth,
                    derived: depth[i],
                });
            }
            for &c in &children[i] {
                if !visited[c] {
                    visited[c] = true;
                    depth[c] = depth[i] + 1;
                    queue.push_back(c);
                }
            }
        }

        for i in 0..n {
            if !visited[i] && !excluded[i] {
                orphans.push(orphan(&slots[i], OrphanReason::Unreachable));
            }
        }

        // Assemble bottom-up: reverse BFS order visits every child before its parent.
        let mut pending: Vec<Vec<CommentNode>> = vec![Vec::new(); n];
        let mut cells: Vec<Option<Comment>> = slots.into_iter().map(Some).collect();
        let mut root_nodes = Vec::with_capacity(roots.len());
        for &i in order.iter().rev() {
            let Some(mut comment) = cells[i].take() else {
                continue;
            };
            comment.depth = depth[i];
            let mut kids = std::mem::take(&mut pending[i]);
            kids.reverse();
            let node = CommentNode {
                score: VoteTally::score(&comment),
                children: kids,
                comment,
            };
            match node.comment.parent.and_then(|p| slot_of.get(&p).copied()) {
                Some(p) => pending[p].push(node),
                None => root_nodes.push(node),
            }
        }
        root_nodes.reverse();

        for w in &warnings {
            debug!(
                "Comment {} stored depth {} but parent chain gives {}",
                w.id, w.stored, w.derived
            );
        }
        for o in &orphans {
            debug!("Comment {} excluded from tree: {}", o.id, o.reason);
        }
        if !orphans.is_empty() || !warnings.is_empty() {
            warn!(
                post = %self.post,
                orphans = orphans.len(),
                depth_mismatches = warnings.len(),
                "Comment tree for post {} is inconsistent",
                self.post
            );
        }

        CommentForest {
            roots: root_nodes,
            orphans,
            warnings,
        }
    }
}

fn orphan(comment: &Comment, reason: OrphanReason) -> OrphanedComment {
    OrphanedComment {
        id: comment.id,
        parent: comment.parent,
        reason,
    }
}
