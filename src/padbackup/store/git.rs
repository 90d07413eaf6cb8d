use super::{CommitOutcome, VersionedStore};
use crate::error::Result;
use crate::model::AuthorDate;
use git2::{Commit, Delta, ErrorCode, Oid, Repository, Signature, Sort, Time};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const BLOB_MODE: i32 = 0o100644;

/// Which commit last changed each path, valid while HEAD is `head`.
struct ChangeIndex {
    head: Oid,
    last_change: HashMap<PathBuf, Oid>,
}

/// A site's backup repository: a standard git repo with one file per pad.
///
/// Commits are built from HEAD's tree plus the one file being written, so the
/// on-disk working tree and index never decide what gets recorded.
pub struct GitStore {
    repo: Repository,
    root: PathBuf,
    fallback_name: String,
    fallback_email: String,
    changes: RefCell<Option<ChangeIndex>>,
}

impl GitStore {
    /// Open the repository at `root`, creating the directory and running
    /// `git init` on first use.
    pub fn open_or_init(root: &Path) -> Result<Self> {
        if !root.exists() {
            fs::create_dir_all(root)?;
        }
        let repo = if root.join(".git").exists() {
            Repository::open(root)?
        } else {
            debug!(path = %root.display(), "initializing backup repository");
            Repository::init(root)?
        };
        Ok(Self {
            repo,
            root: root.to_path_buf(),
            fallback_name: "padbackup".to_string(),
            fallback_email: "padbackup@localhost".to_string(),
            changes: RefCell::new(None),
        })
    }

    /// Open the repository at `root` only if one is already there.
    pub fn open_existing(root: &Path) -> Result<Option<Self>> {
        if !root.join(".git").exists() {
            return Ok(None);
        }
        Self::open_or_init(root).map(Some)
    }

    /// Identity used when the repository's git config has none.
    pub fn with_fallback_identity(mut self, name: &str, email: &str) -> Self {
        self.fallback_name = name.to_string();
        self.fallback_email = email.to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn identity(&self) -> (String, String) {
        match self.repo.signature() {
            Ok(sig) => (
                sig.name().unwrap_or(&self.fallback_name).to_string(),
                sig.email().unwrap_or(&self.fallback_email).to_string(),
            ),
            Err(_) => (self.fallback_name.clone(), self.fallback_email.clone()),
        }
    }

    fn head_commit(&self) -> Result<Option<Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn blob_at(commit: &Commit<'_>, path: &Path) -> Result<Option<Oid>> {
        match commit.tree()?.get_path(path) {
            Ok(entry) => Ok(Some(entry.id())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// One walk over the history reachable from `head`, diffing each commit
    /// against its first parent.
    fn build_change_index(&self, head: Oid) -> Result<ChangeIndex> {
        let mut last_change = HashMap::new();
        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL)?;
        walk.push(head)?;

        for oid in walk {
            let commit = self.repo.find_commit(oid?)?;
            let tree = commit.tree()?;
            let parent_tree = if commit.parent_count() == 0 {
                None
            } else {
                Some(commit.parent(0)?.tree()?)
            };
            let diff = self
                .repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
            for delta in diff.deltas() {
                if delta.status() == Delta::Deleted {
                    continue;
                }
                if let Some(path) = delta.new_file().path() {
                    last_change.entry(path.to_path_buf()).or_insert(commit.id());
                }
            }
        }
        debug!(head = %head, paths = last_change.len(), "indexed history");
        Ok(ChangeIndex { head, last_change })
    }

    /// Newest commit whose version of `path` differs from its first parent's.
    fn last_change_of(&self, head: &Commit<'_>, path: &Path) -> Result<Option<Oid>> {
        let fresh = matches!(&*self.changes.borrow(), Some(index) if index.head == head.id());
        if !fresh {
            let index = self.build_change_index(head.id())?;
            *self.changes.borrow_mut() = Some(index);
        }
        Ok(self
            .changes
            .borrow()
            .as_ref()
            .and_then(|index| index.last_change.get(path).copied()))
    }

    /// Keep the index cache valid across our own commits instead of rewalking.
    fn record_change(&self, parent: Option<Oid>, commit: Oid, path: &str) {
        let mut changes = self.changes.borrow_mut();
        match changes.as_mut() {
            Some(index) if Some(index.head) == parent => {
                index.head = commit;
                index.last_change.insert(PathBuf::from(path), commit);
            }
            _ => *changes = None,
        }
    }

    /// Make the working tree copy match what HEAD holds.
    fn sync_worktree(&self, path: &str, content: &[u8]) -> Result<()> {
        let file = self.root.join(path);
        let matches = match fs::read(&file) {
            Ok(existing) => existing == content,
            Err(_) => false,
        };
        if !matches {
            fs::write(&file, content)?;
        }
        Ok(())
    }
}

fn message_of(commit: &Commit<'_>) -> String {
    String::from_utf8_lossy(commit.message_bytes()).into_owned()
}

impl VersionedStore for GitStore {
    fn commit(
        &mut self,
        path: &str,
        content: &[u8],
        author_date: AuthorDate,
        message: &str,
    ) -> Result<CommitOutcome> {
        let parent = self.head_commit()?;
        if let Some(head) = &parent {
            if let Some(existing) = Self::blob_at(head, Path::new(path))? {
                if self.repo.find_blob(existing)?.content() == content {
                    self.sync_worktree(path, content)?;
                    return Ok(CommitOutcome::Unchanged);
                }
            }
        }

        let blob = self.repo.blob(content)?;
        let base = match &parent {
            Some(head) => Some(head.tree()?),
            None => None,
        };
        let mut builder = self.repo.treebuilder(base.as_ref())?;
        builder.insert(path, blob, BLOB_MODE)?;
        let tree = self.repo.find_tree(builder.write()?)?;

        let (name, email) = self.identity();
        let when = Time::new(author_date.seconds, author_date.offset_minutes);
        let author = Signature::new(&name, &email, &when)?;
        let committer = Signature::now(&name, &email)?;

        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &author, &committer, message, &tree, &parents)?;
        debug!(%oid, path, "committed");
        self.record_change(parent.as_ref().map(Commit::id), oid, path);

        // HEAD is already durable; the index and working tree only follow it.
        let mut index = self.repo.index()?;
        index.read_tree(&tree)?;
        index.write()?;
        self.sync_worktree(path, content)?;
        Ok(CommitOutcome::Committed(oid.to_string()))
    }

    fn last_commit_message(&self, path: Option<&str>) -> Result<Option<String>> {
        let head = match self.head_commit()? {
            Some(head) => head,
            None => return Ok(None),
        };
        let path = match path {
            None => return Ok(Some(message_of(&head))),
            Some(path) => Path::new(path),
        };
        if Self::blob_at(&head, path)?.is_none() {
            return Ok(None);
        }
        match self.last_change_of(&head, path)? {
            Some(oid) => Ok(Some(message_of(&self.repo.find_commit(oid)?))),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for GitStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitStore").field("root", &self.root).finish()
    }
}
