use super::{CommitOutcome, VersionedStore};
use crate::error::{BackupError, Result};
use crate::model::AuthorDate;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A commit recorded by [`MemStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemCommit {
    pub path: String,
    pub content: Vec<u8>,
    pub author_date: AuthorDate,
    pub message: String,
}

#[derive(Default)]
struct Inner {
    files: HashMap<String, Vec<u8>>,
    commits: Vec<MemCommit>,
    simulate_write_error: bool,
    fail_after: Option<usize>,
}

/// In-memory history for testing.
///
/// Clones share the same history, so a test can keep one handle for
/// inspection while the engine owns another. Uses `Rc<RefCell<_>>` since
/// backups are single-threaded.
#[derive(Clone, Default)]
pub struct MemStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.inner.borrow_mut().simulate_write_error = simulate;
    }

    /// Fail every commit once `count` commits have been recorded.
    pub fn fail_after_commits(&self, count: usize) {
        self.inner.borrow_mut().fail_after = Some(count);
    }

    pub fn commits(&self) -> Vec<MemCommit> {
        self.inner.borrow().commits.clone()
    }

    pub fn commit_count(&self) -> usize {
        self.inner.borrow().commits.len()
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.borrow().files.get(path).cloned()
    }

    /// Record a commit verbatim, bypassing the content check. Lets tests
    /// plant foreign or corrupt history.
    pub fn push_raw_commit(&self, path: &str, content: &[u8], message: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.files.insert(path.to_string(), content.to_vec());
        inner.commits.push(MemCommit {
            path: path.to_string(),
            content: content.to_vec(),
            author_date: AuthorDate {
                seconds: 0,
                offset_minutes: 0,
            },
            message: message.to_string(),
        });
    }
}

impl VersionedStore for MemStore {
    fn commit(
        &mut self,
        path: &str,
        content: &[u8],
        author_date: AuthorDate,
        message: &str,
    ) -> Result<CommitOutcome> {
        let mut inner = self.inner.borrow_mut();
        if inner.simulate_write_error {
            return Err(BackupError::Store("Simulated write error".to_string()));
        }
        if inner.fail_after.is_some_and(|limit| inner.commits.len() >= limit) {
            return Err(BackupError::Store("Simulated write error".to_string()));
        }
        if inner.files.get(path).map(Vec::as_slice) == Some(content) {
            return Ok(CommitOutcome::Unchanged);
        }

        inner.files.insert(path.to_string(), content.to_vec());
        inner.commits.push(MemCommit {
            path: path.to_string(),
            content: content.to_vec(),
            author_date,
            message: message.to_string(),
        });
        Ok(CommitOutcome::Committed(format!("mem-{}", inner.commits.len())))
    }

    fn last_commit_message(&self, path: Option<&str>) -> Result<Option<String>> {
        let inner = self.inner.borrow();
        let found = match path {
            None => inner.commits.last(),
            Some(path) => inner.commits.iter().rev().find(|c| c.path == path),
        };
        Ok(found.map(|c| c.message.clone()))
    }
}
