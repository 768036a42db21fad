//! File system storage for comments
//!
//! One JSON document per comment under `<base>/comments/<id>.json`. Documents
//! are read and indexed when the store is opened; every write goes to disk
//! before it becomes visible in memory.
//!
//! Several handles may share a directory. Writes hold the document's lock
//! and re-check the revision on disk, so a handle with a stale cache gets a
//! conflict and a refreshed record instead of overwriting newer votes.

use crate::document::{CommentDocument, CURRENT_SCHEMA_VERSION};
use crate::lock::DocumentLock;
use discuss_core::comment::{Comment, CommentValidator, NewComment};
use discuss_core::config::Config;
use discuss_core::error::{DiscussError, Result};
use discuss_core::store::{logged, CommentStore, CommentTable, Persisted, SwapOutcome};
use discuss_core::types::{CommentId, PostId};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File system based comment storage
pub struct FileSystemStore {
    /// Base directory for storage
    base_dir: PathBuf,
    /// Comments subdirectory
    comments_dir: PathBuf,
    /// Indexed records
    table: CommentTable,
    vote_retries: usize,
}

fn storage_error(context: &str, e: std::io::Error) -> DiscussError {
    DiscussError::Storage(format!("{}: {}", context, e))
}

impl FileSystemStore {
    /// Open a store with default settings
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::open(base_dir, &Config::default())
    }

    /// Open a store, loading every document under `base_dir`
    pub fn open(base_dir: impl Into<PathBuf>, config: &Config) -> Result<Self> {
        let base_dir = base_dir.into();
        let comments_dir = base_dir.join("comments");

        let store = Self {
            base_dir,
            comments_dir,
            table: CommentTable::new(
                config.store.deadline(),
                CommentValidator::with_max_length(config.comment.max_body_length),
            ),
            vote_retries: config.store.vote_retries,
        };

        store.ensure_dirs()?;
        let loaded = store.load_all()?;
        info!("Loaded {} comments from {:?}", loaded, store.comments_dir);
        Ok(store)
    }

    /// Open storage in the platform data directory (~/.discuss as fallback)
    pub fn default_location(config: &Config) -> Result<Self> {
        Self::open(Self::default_dir(), config)
    }

    /// Platform data directory for discuss
    pub fn default_dir() -> PathBuf {
        directories::ProjectDirs::from("com", "discuss", "discuss")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".discuss")
            })
    }

    /// Ensure required directories exist
    fn ensure_dirs(&self) -> Result<()> {
        if !self.comments_dir.exists() {
            fs::create_dir_all(&self.comments_dir)
                .map_err(|e| storage_error("Failed to create comments directory", e))?;
            debug!("Created comments directory: {:?}", self.comments_dir);
        }
        Ok(())
    }

    /// Fail reads once the backing directory has gone away
    fn ensure_reachable(&self) -> Result<()> {
        if self.comments_dir.is_dir() {
            Ok(())
        } else {
            Err(DiscussError::Storage(format!(
                "Comments directory {:?} is not available",
                self.comments_dir
            )))
        }
    }

    /// Get the path for a comment document
    fn comment_path(&self, id: &CommentId) -> PathBuf {
        self.comments_dir.join(format!("{}.json", id))
    }

    /// Get a temporary path for atomic writes
    fn temp_path(&self, id: &CommentId) -> PathBuf {
        self.comments_dir.join(format!(".{}.json.tmp", id))
    }

    /// Take the document's lock, waiting no longer than the table deadline
    fn lock_document(&self, id: &CommentId) -> Result<DocumentLock> {
        DocumentLock::acquire(self.temp_path(id), self.table.deadline())
    }

    /// Write a document into its held lock file, then rename it into place
    fn commit_document(&self, lock: DocumentLock, comment: &Comment) -> Result<()> {
        let final_path = self.comment_path(&comment.id);
        let document = CommentDocument::new(comment.clone());

        {
            let mut writer = BufWriter::new(lock.file());
            serde_json::to_writer_pretty(&mut writer, &document)?;
            writer
                .flush()
                .map_err(|e| storage_error("Failed to flush temp file", e))?;
        }
        lock.commit(&final_path)?;

        debug!(
            "Saved comment {} (revision {}) to {:?}",
            comment.id, comment.revision, final_path
        );
        Ok(())
    }

    /// Write a new document, refusing ids another handle already stored
    fn create_document(&self, comment: &Comment) -> Result<()> {
        let lock = self.lock_document(&comment.id)?;
        if self.comment_path(&comment.id).exists() {
            return Err(DiscussError::Validation(format!(
                "Comment with ID {} already exists",
                comment.id
            )));
        }
        self.commit_document(lock, comment)
    }

    /// Write the next revision if the document on disk is still the one it follows
    fn swap_document(&self, next: &Comment) -> Result<Persisted> {
        let lock = self.lock_document(&next.id)?;
        let path = self.comment_path(&next.id);
        if !path.exists() {
            return Err(DiscussError::NotFound(format!("comment {}", next.id)));
        }

        let on_disk = Self::read_document(&path)?;
        if on_disk.revision + 1 != next.revision {
            debug!(
                "Comment {} is at revision {} on disk, expected {}",
                next.id,
                on_disk.revision,
                next.revision - 1
            );
            return Ok(Persisted::Stale(on_disk));
        }

        self.commit_document(lock, next)?;
        Ok(Persisted::Written)
    }

    fn delete_document(&self, comment: &Comment) -> Result<()> {
        let _lock = self.lock_document(&comment.id)?;
        let path = self.comment_path(&comment.id);
        fs::remove_file(&path).map_err(|e| storage_error("Failed to delete comment file", e))?;
        debug!("Deleted comment {} from {:?}", comment.id, path);
        Ok(())
    }

    /// Read and parse a comment document
    fn read_document(path: &Path) -> Result<Comment> {
        let file = fs::File::open(path).map_err(|e| storage_error("Failed to open comment file", e))?;
        let reader = BufReader::new(file);
        let document: CommentDocument = serde_json::from_reader(reader)?;

        if document.schema_version != CURRENT_SCHEMA_VERSION {
            info!(
                "Reading comment document version {} with reader version {}",
                document.schema_version, CURRENT_SCHEMA_VERSION
            );
        }
        document.check_version()?;
        Ok(document.into_comment())
    }

    /// Load every readable document into the table
    fn load_all(&self) -> Result<usize> {
        let entries = fs::read_dir(&self.comments_dir)
            .map_err(|e| storage_error("Failed to read comments directory", e))?;

        let mut comments = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();

            // Skip non-json files and temp files
            if !path.extension().map(|e| e == "json").unwrap_or(false) {
                continue;
            }
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with('.'))
                .unwrap_or(false)
            {
                continue;
            }

            match Self::read_document(&path) {
                Ok(comment) => comments.push(comment),
                Err(e) => {
                    warn!("Failed to read comment file {:?}: {}", path, e);
                }
            }
        }

        self.table.restore(comments)
    }

    /// Get base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get comments directory
    pub fn comments_dir(&self) -> &PathBuf {
        &self.comments_dir
    }

    fn read<T>(&self, operation: &'static str, f: impl FnOnce(&CommentTable) -> Result<T>) -> Result<T> {
        logged(operation, self.ensure_reachable().and_then(|_| f(&self.table)))
    }
}

impl CommentStore for FileSystemStore {
    fn insert(&self, comment: NewComment) -> Result<Comment> {
        logged(
            "insert",
            self.table.insert_with(comment, |c| self.create_document(c)),
        )
    }

    fn get(&self, id: &CommentId) -> Result<Comment> {
        self.read("get", |table| table.get(id))
    }

    fn find_by_parent(&self, parent: &CommentId) -> Result<Vec<Comment>> {
        self.read("find_by_parent", |table| table.find_by_parent(parent))
    }

    fn find_by_post(&self, post: &PostId) -> Result<Vec<Comment>> {
        self.read("find_by_post", |table| table.find_by_post(post))
    }

    fn find_by_creator(&self, creator: &str) -> Result<Vec<Comment>> {
        self.read("find_by_creator", |table| table.find_by_creator(creator))
    }

    fn find_top_level_by_post(&self, post: &PostId) -> Result<Vec<Comment>> {
        self.read("find_top_level_by_post", |table| {
            table.find_top_level_by_post(post)
        })
    }

    fn count_by_post(&self, post: &PostId) -> Result<usize> {
        self.read("count_by_post", |table| table.count_by_post(post))
    }

    fn remove(&self, id: &CommentId) -> Result<Comment> {
        logged(
            "remove",
            self.table.remove_with(id, |c| self.delete_document(c)),
        )
    }

    fn compare_and_swap(&self, comment: Comment) -> Result<SwapOutcome> {
        logged(
            "compare_and_swap",
            self.table
                .compare_and_swap_with(comment, |c| self.swap_document(c)),
        )
    }

    fn vote_retries(&self) -> usize {
        self.vote_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discuss_core::comment::{CommentBuilder, TreeBuilder, VoteState, VoteTally};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn create_test_store() -> (FileSystemStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemStore::new(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    fn post() -> PostId {
        PostId("post-1".to_string())
    }

    fn new_root(body: &str) -> NewComment {
        CommentBuilder::new(post())
            .creator("alice")
            .body(body)
            .build()
            .unwrap()
    }

    #[test]
    fn test_store_creation() {
        let (store, _temp) = create_test_store();
        assert!(store.comments_dir().exists());
    }

    #[test]
    fn test_comment_path() {
        let (store, _temp) = create_test_store();
        let id = CommentId::new();

        let path = store.comment_path(&id);
        assert!(path.to_string_lossy().ends_with(".json"));
        assert!(path.to_string_lossy().contains(&id.to_string()));
    }

    #[test]
    fn test_insert_and_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let (root, reply) = {
            let store = FileSystemStore::new(temp_dir.path()).unwrap();
            let root = store.insert(new_root("root")).unwrap();
            let reply = store
                .insert(
                    CommentBuilder::reply(post(), root.id)
                        .creator("bob")
                        .body("reply")
                        .build()
                        .unwrap(),
                )
                .unwrap();
            (root, reply)
        };

        let reopened = FileSystemStore::new(temp_dir.path()).unwrap();
        assert_eq!(reopened.get(&root.id).unwrap(), root);
        assert_eq!(reopened.get(&reply.id).unwrap().depth, 1);
        assert_eq!(reopened.find_by_parent(&root.id).unwrap().len(), 1);
        assert_eq!(reopened.find_top_level_by_post(&post()).unwrap().len(), 1);
    }

    #[test]
    fn test_votes_are_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let id = {
            let store = FileSystemStore::new(temp_dir.path()).unwrap();
            let c = store.insert(new_root("vote on me")).unwrap();
            store.add_upvote(&c.id, "bob").unwrap();
            store.add_downvote(&c.id, "carol").unwrap();
            store.add_downvote(&c.id, "dave").unwrap();
            store.add_report(&c.id, "erin").unwrap();
            c.id
        };

        let reopened = FileSystemStore::new(temp_dir.path()).unwrap();
        let c = reopened.get(&id).unwrap();
        assert_eq!(VoteTally::score(&c), -1);
        assert_eq!(VoteTally::vote_state(&c, "bob"), VoteState::Upvoted);
        assert_eq!(c.reports.len(), 1);
        assert_eq!(c.revision, 4);
    }

    #[test]
    fn test_remove_deletes_file() {
        let (store, _temp) = create_test_store();
        let c = store.insert(new_root("bye")).unwrap();
        let path = store.comment_path(&c.id);
        assert!(path.exists());

        store.remove(&c.id).unwrap();
        assert!(!path.exists());
        assert!(store.get(&c.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_atomic_write() {
        let (store, _temp) = create_test_store();
        let c = store.insert(new_root("atomic")).unwrap();

        // Check that temp file doesn't exist
        assert!(!store.temp_path(&c.id).exists());

        // Check file content
        let content = fs::read_to_string(store.comment_path(&c.id)).unwrap();
        assert!(content.contains("schema_version"));
        assert!(content.contains(&c.id.to_string()));
    }

    #[test]
    fn test_unreachable_directory_is_storage_error() {
        let (store, _temp) = create_test_store();
        let c = store.insert(new_root("soon gone")).unwrap();
        fs::remove_dir_all(store.comments_dir()).unwrap();

        let err = store.find_by_post(&post()).unwrap_err();
        assert!(err.is_storage());

        let err = store.add_upvote(&c.id, "bob").unwrap_err();
        assert!(err.is_storage());

        let err = store.insert(new_root("nowhere to go")).unwrap_err();
        assert!(err.is_storage());
    }

    #[test]
    fn test_failed_write_keeps_memory_unchanged() {
        let (store, _temp) = create_test_store();
        let c = store.insert(new_root("stable")).unwrap();
        fs::remove_dir_all(store.comments_dir()).unwrap();

        let lost = CommentBuilder::new(post())
            .creator("bob")
            .body("lost")
            .build()
            .unwrap();
        assert!(store.insert(lost).unwrap_err().is_storage());

        fs::create_dir_all(store.comments_dir()).unwrap();
        let all = store.find_by_post(&post()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, c.id);
        assert_eq!(store.get(&c.id).unwrap().revision, 0);
    }

    #[test]
    fn test_two_handles_keep_each_others_votes() {
        let temp_dir = TempDir::new().unwrap();
        let first = FileSystemStore::new(temp_dir.path()).unwrap();
        let c = first.insert(new_root("shared")).unwrap();
        let second = FileSystemStore::new(temp_dir.path()).unwrap();

        first.add_upvote(&c.id, "alice").unwrap();
        // The second handle still caches revision 0
        let after = second.add_upvote(&c.id, "bob").unwrap();
        assert_eq!(after.revision, 2);
        assert!(after.upvotes.contains("alice"));

        let reopened = FileSystemStore::new(temp_dir.path()).unwrap();
        let stored = reopened.get(&c.id).unwrap();
        assert_eq!(stored.revision, 2);
        assert_eq!(VoteTally::score(&stored), 2);
        assert_eq!(VoteTally::vote_state(&stored, "alice"), VoteState::Upvoted);
        assert_eq!(VoteTally::vote_state(&stored, "bob"), VoteState::Upvoted);
    }

    #[test]
    fn test_two_handles_voting_concurrently() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.store.vote_retries = 1_000;

        let id = FileSystemStore::open(temp_dir.path(), &config)
            .unwrap()
            .insert(new_root("busy"))
            .unwrap()
            .id;
        let handles: Vec<_> = (0..2)
            .map(|_| Arc::new(FileSystemStore::open(temp_dir.path(), &config).unwrap()))
            .collect();

        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let store = Arc::clone(&handles[worker % 2]);
                thread::spawn(move || {
                    for vote in 0..10 {
                        store
                            .add_upvote(&id, &format!("voter-{}-{}", worker, vote))
                            .unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let reopened = FileSystemStore::open(temp_dir.path(), &config).unwrap();
        let stored = reopened.get(&id).unwrap();
        assert_eq!(stored.upvotes.len(), 40);
        assert_eq!(stored.revision, 40);
    }

    #[test]
    fn test_pinned_id_is_unique_across_handles() {
        let temp_dir = TempDir::new().unwrap();
        let first = FileSystemStore::new(temp_dir.path()).unwrap();
        let second = FileSystemStore::new(temp_dir.path()).unwrap();

        let id = CommentId::new();
        let pinned = |creator: &str| {
            CommentBuilder::new(post())
                .id(id)
                .creator(creator)
                .body("pinned")
                .build()
                .unwrap()
        };

        first.insert(pinned("alice")).unwrap();
        let err = second.insert(pinned("mallory")).unwrap_err();
        assert!(matches!(err, DiscussError::Validation(_)));

        let reopened = FileSystemStore::new(temp_dir.path()).unwrap();
        assert_eq!(reopened.get(&id).unwrap().creator, "alice");
        assert!(!second.temp_path(&id).exists());
    }

    #[test]
    fn test_held_lock_times_out_writers() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.store.deadline_ms = 50;
        let store = FileSystemStore::open(temp_dir.path(), &config).unwrap();
        let c = store.insert(new_root("locked")).unwrap();

        // Another process is mid-write
        fs::write(store.temp_path(&c.id), "").unwrap();

        let err = store.add_upvote(&c.id, "bob").unwrap_err();
        assert!(matches!(err, DiscussError::Timeout { .. }));
        assert_eq!(store.get(&c.id).unwrap().revision, 0);
    }

    #[test]
    fn test_ignores_temp_and_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = FileSystemStore::new(temp_dir.path()).unwrap();
            store.insert(new_root("real")).unwrap();
            fs::write(store.comments_dir().join(".partial.json.tmp"), "{").unwrap();
            fs::write(store.comments_dir().join("readme.txt"), "test").unwrap();
            fs::write(store.comments_dir().join("broken.json"), "not json").unwrap();
        }

        let reopened = FileSystemStore::new(temp_dir.path()).unwrap();
        assert_eq!(reopened.find_by_post(&post()).unwrap().len(), 1);
    }

    #[test]
    fn test_incompatible_document_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let id = {
            let store = FileSystemStore::new(temp_dir.path()).unwrap();
            let c = store.insert(new_root("future")).unwrap();
            let path = store.comment_path(&c.id);
            let mut doc: serde_json::Value =
                serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
            doc["schema_version"] = serde_json::json!("2.0");
            fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();
            c.id
        };

        let reopened = FileSystemStore::new(temp_dir.path()).unwrap();
        assert!(reopened.get(&id).is_err());
    }

    #[test]
    fn test_tree_from_hand_edited_documents() {
        let temp_dir = TempDir::new().unwrap();
        let (root, reply) = {
            let store = FileSystemStore::new(temp_dir.path()).unwrap();
            let root = store.insert(new_root("root")).unwrap();
            let reply = store
                .insert(
                    CommentBuilder::reply(post(), root.id)
                        .creator("bob")
                        .body("reply")
                        .build()
                        .unwrap(),
                )
                .unwrap();

            // Corrupt the stored depth of the reply
            let path = store.comment_path(&reply.id);
            let mut doc: serde_json::Value =
                serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
            doc["comment"]["depth"] = serde_json::json!(5);
            fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();
            (root, reply)
        };

        let reopened = FileSystemStore::new(temp_dir.path()).unwrap();
        let forest = TreeBuilder::new(post()).build(reopened.find_by_post(&post()).unwrap());

        assert_eq!(forest.roots[0].id(), root.id);
        assert_eq!(forest.roots[0].children[0].comment.depth, 1);
        assert_eq!(forest.warnings.len(), 1);
        assert_eq!(forest.warnings[0].id, reply.id);
        assert_eq!(forest.warnings[0].stored, 5);
    }
}
